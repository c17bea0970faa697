mod common;
mod dispatcher;
mod routing;
