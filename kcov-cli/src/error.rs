//! Errors of the command line tools.

error_chain! {
    links {
        Kcov(::kcov::Error, ::kcov::ErrorKind);
    }

    foreign_links {
        Io(::std::io::Error);
        Json(::serde_json::Error);
        Persist(::tempfile::PersistError);
    }
}
