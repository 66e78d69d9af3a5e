use crate::config;
use crate::error::Result;
use std::{
    fs,
    io::{BufReader, Write},
    path::Path,
};

pub fn json_to_config<P: AsRef<Path>>(path: P) -> Result<config::Config> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

pub fn write_config_json<P: AsRef<Path>>(path: P, config: &config::Config) -> Result<()> {
    let j = serde_json::to_string_pretty(config)?;
    let mut file = fs::File::create(path)?;
    file.write_all(j.as_bytes())?;
    Ok(())
}
