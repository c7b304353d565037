pub type Result<T> = std::result::Result<T, crate::error::Error>;

#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

#[inline]
pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_arg(name, condition)
    }
}

#[cold]
pub fn invalid_arg(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidArgument {
        name: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;

    fn checked(alignment: usize) -> super::Result<usize> {
        verify_arg!(alignment, alignment.is_power_of_two());
        Ok(alignment)
    }

    #[test]
    fn test_verify_arg() {
        assert_eq!(checked(64).unwrap(), 64);
        let err = checked(48).unwrap_err();
        match err.kind() {
            ErrorKind::InvalidArgument { name, message } => {
                assert_eq!(name, "alignment");
                assert_eq!(message, "alignment.is_power_of_two()");
            }
            other => panic!("unexpected error kind: {other:?}"),
        }
    }
}
