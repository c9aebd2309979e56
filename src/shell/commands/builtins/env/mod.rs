pub mod cd;
pub mod chprompt;
pub mod pwd;
pub mod quit;
pub mod showpid;
