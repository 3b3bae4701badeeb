mod active_driver;
mod dispatcher;

pub(crate) use active_driver::ActiveDriver;
pub(crate) use dispatcher::Dispatcher;
