use crate::storage::{FileRecord, UrlRecord};
use migration::entities::{file_record, url_record};

/// 将 Sea-ORM Model 转换为 FileRecord
pub fn model_to_file_record(model: file_record::Model) -> FileRecord {
    FileRecord {
        identifier: model.identifier,
        display_name: model.display_name,
        expires_at: model.expires_at,
    }
}

/// 将 FileRecord 转换为 ActiveModel（仅用于插入，记录创建后不可修改）
pub fn file_record_to_active_model(record: &FileRecord) -> file_record::ActiveModel {
    use sea_orm::ActiveValue::Set;

    file_record::ActiveModel {
        identifier: Set(record.identifier.clone()),
        display_name: Set(record.display_name.clone()),
        expires_at: Set(record.expires_at),
    }
}

pub fn model_to_url_record(model: url_record::Model) -> UrlRecord {
    UrlRecord {
        identifier: model.identifier,
        target_url: model.target_url,
        expires_at: model.expires_at,
    }
}

pub fn url_record_to_active_model(record: &UrlRecord) -> url_record::ActiveModel {
    use sea_orm::ActiveValue::Set;

    url_record::ActiveModel {
        identifier: Set(record.identifier.clone()),
        target_url: Set(record.target_url.clone()),
        expires_at: Set(record.expires_at),
    }
}
