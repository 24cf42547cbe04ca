use std::sync::Arc;

use tuition_core::runtime::TargetRuntime;

mod file;
mod http;

pub fn init() -> TargetRuntime {
    TargetRuntime {
        http: Arc::new(http::NativeHttp::default()),
        file: Arc::new(file::NativeFileIO::default()),
    }
}
