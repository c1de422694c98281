pub(crate) mod motion;
pub(crate) mod transitions;
