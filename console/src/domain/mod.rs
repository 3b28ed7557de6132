//! Domain primitives, rules and services for admin console views.
//!
//! Purpose: resolve layered table configuration into an ordered, filtered
//! view per entity, operator and record. Everything here is transport
//! agnostic; collaborators are reached through [`ports`].
//!
//! Public surface:
//! - Identifiers and records: `EntityId`, `ColumnId`, `Record`.
//! - Pure rules: conditional visibility, role permissions, computed fields
//!   and formatters.
//! - Services: `ColumnVisibilityManager`, `SettingsBridge` and
//!   `EntityViewResolver`.
//! - `DomainError` with a stable `ErrorCode`.

pub mod columns;
pub mod computed;
pub mod condition;
pub mod error;
pub mod field_spec;
pub mod format;
pub mod ids;
pub mod ports;
pub mod record;
pub mod role;
pub mod settings;
pub mod view_resolver;

pub use self::columns::{
    ColumnSettings, ColumnVisibilityError, ColumnVisibilityManager, ComputedColumn,
    FilterableColumns, TableConfig, TableConfigValidationError, UserColumnPreference,
    default_columns, normalize_columns, reorder_columns, sanitize_override, toggle_column,
};
pub use self::computed::{ComputeError, ComputeFn, ComputedFieldEngine, Trend};
pub use self::condition::{
    Condition, ConditionalVisibility, Expectation, Predicate, evaluate_condition,
    should_show_field,
};
pub use self::error::{DomainError, DomainErrorValidationError, ErrorCode};
pub use self::field_spec::{FieldSpec, FieldType, decode_field_specs};
pub use self::format::{DynamicFormatter, FormatFn, RenderDescriptor, RiskLevel};
pub use self::ids::{ColumnId, EntityId, IdValidationError};
pub use self::record::{Record, RecordShapeError};
pub use self::role::{
    MinRole, ParseRoleError, Permission, ROLE_HIERARCHY, Role, get_role_permissions,
    has_field_permission, role_rank, role_sufficient,
};
pub use self::settings::{
    BootstrapOutcome, DEFAULT_BOOTSTRAP_THROTTLE, Reconciliation, SettingState, SettingsBridge,
};
pub use self::view_resolver::{EntityView, EntityViewResolver, ResolvedColumn, ResolvedField};
