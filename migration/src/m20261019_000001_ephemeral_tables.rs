use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

/// 与应用层 MAX_IDENTIFIER_LEN 一致
const IDENTIFIER_LEN: u32 = 128;

/// Primary key column for identifiers.
///
/// Identifiers are case-sensitive. MySQL/MariaDB default to a `_ci`
/// collation, so the column is pinned to `utf8mb4_bin` there.
fn identifier_column<T: IntoIden>(backend: DatabaseBackend, name: T) -> ColumnDef {
    let mut column = ColumnDef::new(name);
    column.string_len(IDENTIFIER_LEN).not_null().primary_key();
    if backend == DatabaseBackend::MySql {
        column.extra("CHARACTER SET utf8mb4 COLLATE utf8mb4_bin");
    }
    column
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        // 上传文件元数据表，identifier 同时是 blob 文件名
        manager
            .create_table(
                Table::create()
                    .table(Files::Table)
                    .if_not_exists()
                    .col(identifier_column(backend, Files::Identifier))
                    .col(ColumnDef::new(Files::DisplayName).text().not_null())
                    .col(
                        ColumnDef::new(Files::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 短链接表
        manager
            .create_table(
                Table::create()
                    .table(Urls::Table)
                    .if_not_exists()
                    .col(identifier_column(backend, Urls::Identifier))
                    .col(ColumnDef::new(Urls::TargetUrl).text().not_null())
                    .col(
                        ColumnDef::new(Urls::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 清理任务按过期时间扫描
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_files_expires_at")
                    .table(Files::Table)
                    .col(Files::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_urls_expires_at")
                    .table(Urls::Table)
                    .col(Urls::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_urls_expires_at")
                    .table(Urls::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_files_expires_at")
                    .table(Files::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Urls::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Files::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Files {
    Table,
    Identifier,
    DisplayName,
    ExpiresAt,
}

#[derive(DeriveIden)]
enum Urls {
    Table,
    Identifier,
    TargetUrl,
    ExpiresAt,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files_table(backend: DatabaseBackend) -> TableCreateStatement {
        Table::create()
            .table(Files::Table)
            .col(identifier_column(backend, Files::Identifier))
            .to_owned()
    }

    #[test]
    fn test_mysql_identifier_is_binary_collated() {
        let sql = files_table(DatabaseBackend::MySql).to_string(MysqlQueryBuilder);
        assert!(sql.contains("COLLATE utf8mb4_bin"), "{}", sql);
        assert!(sql.contains("varchar(128)"), "{}", sql);
    }

    #[test]
    fn test_other_backends_keep_default_collation() {
        let sql = files_table(DatabaseBackend::Sqlite).to_string(SqliteQueryBuilder);
        assert!(!sql.contains("COLLATE"), "{}", sql);
        let sql = files_table(DatabaseBackend::Postgres).to_string(PostgresQueryBuilder);
        assert!(!sql.contains("COLLATE"), "{}", sql);
    }
}
