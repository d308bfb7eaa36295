//! Domain models for the access code service.

pub mod access_code;
pub mod batch;
pub mod dashboard;
pub mod export;
pub mod listing;
pub mod requests;

pub use access_code::{
    mask_hash, usage_label, AccessCode, AccessCodePatch, CodeStatus, CodeView, InsertedCode,
    NewAccessCode, UNLIMITED_LABEL, UNLIMITED_MAX_USES,
};
pub use batch::{BatchMode, CodeBatchSummary, BATCH_SCAN_FACTOR, DEFAULT_BATCH_LIMIT};
pub use dashboard::{
    DashboardGeneration, DashboardPayload, DashboardStats, RecentCode, TrendPoint,
    DASHBOARD_SCAN_CAP, EXPIRING_SOON_DAYS, RECENT_CODES, TREND_DAYS,
};
pub use export::{
    ExportColumn, ExportContent, ExportFile, ExportFormat, ExportOptions, ExportReport,
    ExportScope, MAX_EXPORT_RECORDS,
};
pub use listing::{CodeFilters, CodeListResponse, StatusFilter, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use requests::{
    CreateCodeRequest, CreateCodeResult, CreateMode, UpdateCodeRequest, BULK_GENERATION_LIMIT,
    MIN_CUSTOM_CODE_LENGTH,
};
