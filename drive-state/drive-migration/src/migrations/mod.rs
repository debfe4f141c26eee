pub mod m20250101_000001_create_drive_table;
