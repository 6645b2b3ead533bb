pub const FULL: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "+git.",
    env!("AUTOMOTIONS_GIT_SHA"),
    env!("AUTOMOTIONS_GIT_DIRTY")
);
