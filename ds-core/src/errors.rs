pub use anyhow::{
    anyhow,
    bail,
    ensure,
};
pub use paste::paste;
pub use thiserror::Error;

pub type EmptyResult = anyhow::Result<()>;

// This macro creates an enum which derives from thiserror::Error, and also
// creates constructor functions in snake case for each of the enum variants
#[macro_export]
macro_rules! err_impl {
    (@hidden $errtype:ident, $item:ident, String) => {
        paste! {
            pub(crate) fn [<$item:snake>](in_: &str) -> anyhow::Error {
                anyhow!{$errtype::$item(in_.into())}
            }
        }
    };

    (@hidden $errtype:ident, $item:ident, $($dtype:tt)::+) => {
        paste! {
            pub(crate) fn [<$item:snake>](in_: &$($dtype)::+) -> anyhow::Error {
                anyhow!{$errtype::$item(in_.clone())}
            }
        }
    };

    ($errtype:ident,
        $(#[$errinfo:meta] $item:ident($($dtype:tt)::+),)+
    ) => {
        #[derive(Debug, Error)]
        pub(crate) enum $errtype {
            $(#[$errinfo] $item($($dtype)::+)),+
        }

        impl $errtype {
            $(err_impl! {@hidden $errtype, $item, $($dtype)::+})+
        }
    };
}

pub use err_impl;

/// A set of independent failures collected while continuing past each one.
#[derive(Debug, Error)]
#[error("{}", format_joined(.0))]
pub struct JoinedErrors(pub Vec<anyhow::Error>);

fn format_joined(errs: &[anyhow::Error]) -> String {
    errs.iter().map(|e| format!("{e:#}")).collect::<Vec<_>>().join("\n")
}

/// Collapses a list of collected errors: nothing on an empty list, the error itself when
/// there is exactly one, and a [`JoinedErrors`] otherwise.
pub fn join_errors(mut errs: Vec<anyhow::Error>) -> EmptyResult {
    match errs.len() {
        0 => Ok(()),
        1 => Err(errs.remove(0)),
        _ => Err(JoinedErrors(errs).into()),
    }
}
