use std::{cell::RefCell, ffi::OsStr};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Env {
    /// `LC3VM_STRICT`: reserved opcodes stop the machine.
    pub strict: bool,
    /// `LC3VM_TRACE`: report every instruction.
    pub trace: bool,
    /// `LC3VM_MINIMAL`: plain output, suited for blackbox tests.
    pub minimal: bool,
}

thread_local! {
    /// Must only be mutated within `set_env`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

pub fn init() {
    let value = Env {
        strict: var_is("LC3VM_STRICT", "1"),
        trace: var_is("LC3VM_TRACE", "1"),
        minimal: var_is("LC3VM_MINIMAL", "1"),
    };
    set_env(value);
}

pub fn is_strict() -> bool {
    with_env(|env| env.strict)
}

pub fn is_trace() -> bool {
    with_env(|env| env.trace)
}

pub fn is_minimal() -> bool {
    with_env(|env| env.minimal)
}

fn set_env(value: Env) {
    ENV.with(|env| {
        let mut env = env.borrow_mut();
        assert!(
            env.is_none(),
            "tried to initialize environment state multiple times"
        );
        *env = Some(value);
    });
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    ENV.with(|env| {
        let env = env.borrow();
        let env = env.unwrap_or_else(|| {
            panic!("tried to access environment state before initialization");
        });
        callback(&env)
    })
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variable_is_false() {
        assert!(!var_is("LC3VM_TEST_SURELY_UNSET", "1"));
    }

    #[test]
    fn initialized_once_per_thread() {
        set_env(Env {
            trace: true,
            ..Env::default()
        });
        assert!(is_trace());
        assert!(!is_strict());
        assert!(!is_minimal());
        let again = std::panic::catch_unwind(|| set_env(Env::default()));
        assert!(again.is_err());
    }
}
