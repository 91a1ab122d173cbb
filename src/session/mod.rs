pub(crate) mod compositor;
pub(crate) mod decode;
pub(crate) mod events;
