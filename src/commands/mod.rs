mod index;
mod init;

pub use index::index_articles;
pub use init::init_config;
