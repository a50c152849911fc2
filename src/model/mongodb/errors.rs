//! For some reason, the mongodb crate doesn't provide error code constants.
//! This module fills in the gaps, and sorts driver errors into the cases the
//! vote transaction needs to tell apart.

use mongodb::error::{
    Error as DbError, ErrorKind, WriteFailure, TRANSIENT_TRANSACTION_ERROR,
};

use crate::model::store::StoreError;

const DUPLICATE_KEY: i32 = 11000;

/// Return true if the given error is a duplicate key write error.
fn is_duplicate_key_error(err: &DbError) -> bool {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(ref e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Return true if the server says the whole transaction may succeed if re-run.
fn is_transient_transaction_error(err: &DbError) -> bool {
    err.contains_label(TRANSIENT_TRANSACTION_ERROR)
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        if is_duplicate_key_error(&err) {
            StoreError::DuplicateBallot
        } else if is_transient_transaction_error(&err) {
            StoreError::Conflict(err.to_string())
        } else {
            StoreError::Db(err)
        }
    }
}
