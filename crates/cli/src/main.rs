mod app;
mod args;
mod build_info;
mod cmd_fetch;
mod cmd_list;
mod cmd_watch;

pub(crate) use app::Executable;

fn main() {
    app::exec()
}
