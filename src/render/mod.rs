pub(crate) mod painter;
