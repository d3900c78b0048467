use std::{io, thread};

pub(crate) fn spawn_named_thread<F, T, S>(name: S, f: F) -> io::Result<thread::JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
    S: ToString,
{
    thread::Builder::new().name(name.to_string()).spawn(f)
}
