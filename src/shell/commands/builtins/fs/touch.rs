// Touch command: set access and modification times
use chrono::{Local, NaiveDateTime, TimeZone};
use std::fs::{FileTimes, OpenOptions};
use std::time::SystemTime;

use crate::shell::commands::Executable;
use crate::shell::commands::builtins::common::invalid_arguments;
use crate::shell::context::ShellContext;
use crate::shell::error::{ShellError, ShellResult};

/// seconds:minutes:hours:day:month:year
const TIMESTAMP_FORMAT: &str = "%S:%M:%H:%d:%m:%Y";

pub struct TouchCommand;

/// Parses `ss:mm:hh:dd:mm:yyyy` as local time.
pub fn parse_timestamp(text: &str) -> ShellResult<SystemTime> {
    let naive = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .map_err(|_| ShellError::usage(format!("touch: invalid timestamp {}", text)))?;
    let local = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| ShellError::usage(format!("touch: {} does not exist in local time", text)))?;
    Ok(SystemTime::from(local))
}

impl Executable for TouchCommand {
    fn execute(&self, args: &[String], _ctx: &mut ShellContext) -> ShellResult<i32> {
        let [_, path, stamp] = args else {
            return Err(invalid_arguments("touch"));
        };
        let time = parse_timestamp(stamp)?;

        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|err| ShellError::io(format!("touch: {}", path), err))?;
        file.set_times(FileTimes::new().set_accessed(time).set_modified(time))
            .map_err(|err| ShellError::io(format!("touch: {}", path), err))?;
        Ok(0)
    }
}
