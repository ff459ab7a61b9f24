use anyhow::Error;
use settle_config::ConfigError;
use settle_core::time::TimeParseError;
use settle_core::CoreError;
use settle_store::error::{StoreError, StoreErrorKind};
use std::process::ExitCode;
use thiserror::Error as ThisError;

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_NOT_FOUND: u8 = 2;
pub const EXIT_INVALID_INPUT: u8 = 3;
pub const EXIT_CONFLICT: u8 = 4;

#[derive(Debug, ThisError)]
pub enum CliError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
}

pub fn invalid_input(message: impl Into<String>) -> Error {
    CliError::InvalidInput(message.into()).into()
}

pub fn not_found(message: impl Into<String>) -> Error {
    CliError::NotFound(message.into()).into()
}

pub fn report_error(err: &Error, verbose: bool) {
    if verbose {
        eprintln!("error: {:#}", err);
    } else {
        eprintln!("error: {}", err);
    }
}

pub fn exit_code_for(err: &Error) -> ExitCode {
    ExitCode::from(exit_status_for(err))
}

fn exit_status_for(err: &Error) -> u8 {
    for cause in err.chain() {
        if let Some(cli_err) = cause.downcast_ref::<CliError>() {
            return match cli_err {
                CliError::InvalidInput(_) => EXIT_INVALID_INPUT,
                CliError::NotFound(_) => EXIT_NOT_FOUND,
            };
        }
        if let Some(store_err) = cause.downcast_ref::<StoreError>() {
            return store_exit_code(store_err);
        }
        if let Some(config_err) = cause.downcast_ref::<ConfigError>() {
            return config_exit_code(config_err);
        }
        if let Some(core_err) = cause.downcast_ref::<CoreError>() {
            return core_exit_code(core_err);
        }
        if let Some(_parse_err) = cause.downcast_ref::<TimeParseError>() {
            return EXIT_INVALID_INPUT;
        }
    }
    EXIT_FAILURE
}

fn store_exit_code(err: &StoreError) -> u8 {
    match err.kind() {
        StoreErrorKind::NotFound => EXIT_NOT_FOUND,
        StoreErrorKind::Core => err.core().map(core_exit_code).unwrap_or(EXIT_INVALID_INPUT),
        StoreErrorKind::UploadCommitted => EXIT_CONFLICT,
        StoreErrorKind::InvalidId
        | StoreErrorKind::InvalidBackupPath
        | StoreErrorKind::InvalidDataPath => EXIT_INVALID_INPUT,
        StoreErrorKind::MissingHomeDir
        | StoreErrorKind::Migration
        | StoreErrorKind::InvalidData
        | StoreErrorKind::Sql
        | StoreErrorKind::Io => EXIT_FAILURE,
    }
}

/// Refusals caused by where the booking is in its lifecycle are conflicts;
/// everything else is a bad request.
fn core_exit_code(err: &CoreError) -> u8 {
    match err {
        CoreError::InvalidStateTransition { .. }
        | CoreError::StaleTransition { .. }
        | CoreError::RequestIdReused(_)
        | CoreError::CooldownNotElapsed(_)
        | CoreError::AlreadyReviewed
        | CoreError::AlreadyAcceptor(_) => EXIT_CONFLICT,
        _ => EXIT_INVALID_INPUT,
    }
}

fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::MissingHomeDir => EXIT_FAILURE,
        ConfigError::InvalidConfigPath(_)
        | ConfigError::MissingConfigFile(_)
        | ConfigError::InsecurePermissions(_)
        | ConfigError::InvalidCooldownHours(_)
        | ConfigError::InvalidMaxEvidenceImages(_)
        | ConfigError::InvalidBlobPrefix(_)
        | ConfigError::InvalidOrphanAfterHours(_)
        | ConfigError::Read { .. }
        | ConfigError::Parse { .. } => EXIT_INVALID_INPUT,
    }
}

#[cfg(test)]
mod tests {
    use super::{exit_status_for, invalid_input, not_found};
    use anyhow::Context as _;
    use settle_core::domain::BookingStatus;
    use settle_core::rules::BookingAction;
    use settle_core::CoreError;
    use settle_store::error::StoreError;

    #[test]
    fn cli_errors_map_to_codes() {
        assert_eq!(exit_status_for(&invalid_input("bad")), 3);
        assert_eq!(exit_status_for(&not_found("gone")), 2);
    }

    #[test]
    fn lifecycle_refusals_are_conflicts() {
        let err: anyhow::Error = StoreError::Core(CoreError::InvalidStateTransition {
            action: BookingAction::EndService,
            status: BookingStatus::New,
        })
        .into();
        let err = err.context("end service");
        assert_eq!(exit_status_for(&err), 4);

        let err: anyhow::Error = StoreError::Core(CoreError::MissingCancelReason).into();
        assert_eq!(exit_status_for(&err), 3);

        let err: anyhow::Error =
            StoreError::Core(CoreError::RequestIdReused("req-1".to_string())).into();
        assert_eq!(exit_status_for(&err), 4);
    }

    #[test]
    fn store_not_found_maps_to_two() {
        let result: Result<(), StoreError> = Err(StoreError::NotFound("x".to_string()));
        let err = result.context("load booking").unwrap_err();
        assert_eq!(exit_status_for(&err), 2);
    }
}
