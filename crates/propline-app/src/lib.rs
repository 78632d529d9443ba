// propline application: config, OCR, file sources, pipeline and reports.

pub mod config;
pub mod ocr;
pub mod pipeline;
pub mod report;
pub mod sources;
