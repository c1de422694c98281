pub(crate) mod allocator;
pub(crate) mod frames;
