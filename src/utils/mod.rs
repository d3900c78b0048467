pub(crate) mod threads;
