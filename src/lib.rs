pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod api {
    pub mod errors;
    pub mod facts;
    pub mod images;
    pub mod library;
    pub mod quote;
    pub mod records;
    pub mod stats;
    pub mod users;
    pub mod videos;
    pub mod webhooks;
}
pub mod db {
    pub mod memory;
    pub mod models;
    pub mod repository;
    pub mod scoped;
}
pub mod identity {
    pub mod provider;
    pub mod sync;
    pub mod webhook;
}
pub mod inference {
    pub mod client;
}
pub mod storage {
    pub mod client;
    pub mod memory;
    pub mod scoped;
}
pub mod video {
    pub mod client;
}
