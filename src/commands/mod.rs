pub mod datasets;
pub mod recommend;
pub mod scrape;
pub mod serve;
