pub mod usage_csv_file;

pub use usage_csv_file::CsvFileSink;
