pub mod crawler;
pub mod discovery;
pub mod web;

pub use crawler::{FetchedPage, LinkSource, PageRenderer};
pub use discovery::crawl;
pub use web::Browser;
