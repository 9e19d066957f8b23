pub mod file_record;
pub mod url_record;

pub use file_record::Entity as FileRecordEntity;
pub use url_record::Entity as UrlRecordEntity;
