/// Validates the positional arguments left after flag parsing
pub type Validator = Box<dyn Fn(&[String]) -> Result<(), String>>;

/// Require exactly `n` arguments
pub fn exact_args(n: usize) -> Validator {
    Box::new(move |args| {
        if args.len() != n {
            return Err(format!("requires {} args, received {}", n, args.len()));
        }
        Ok(())
    })
}

/// Require at least `n` arguments
pub fn minimum_args(n: usize) -> Validator {
    Box::new(move |args| {
        if args.len() < n {
            return Err(format!("requires at least {} args, received {}", n, args.len()));
        }
        Ok(())
    })
}

/// Require no more than `n` arguments
pub fn maximum_args(n: usize) -> Validator {
    Box::new(move |args| {
        if args.len() > n {
            return Err(format!("requires no more than {} args, received {}", n, args.len()));
        }
        Ok(())
    })
}

/// Require between `min` and `max` arguments, inclusive
pub fn range_args(min: usize, max: usize) -> Validator {
    combine(vec![minimum_args(min), maximum_args(max)])
}

pub fn no_args() -> Validator {
    Box::new(|args| {
        if !args.is_empty() {
            return Err(format!("accepts no args, received {}", args.len()));
        }
        Ok(())
    })
}

/// Run validators in order, stopping at the first failure
pub fn combine(validators: Vec<Validator>) -> Validator {
    Box::new(move |args| validators.iter().try_for_each(|validate| validate(args)))
}
