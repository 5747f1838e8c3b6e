pub mod auth;
pub mod rest;
pub mod state;

// Re-export the REST handlers to make them easily accessible
// to the binary that will build the web server router.
pub use rest::{
    add_book_handler, list_books_handler, profile_handler, search_handler, watch_books_handler,
};
