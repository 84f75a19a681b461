use super::Host;
use crate::Result;
use crate::config::Config;
use camino::Utf8PathBuf;
use clap::Parser;
use ohno::IntoAppError;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Output configuration file path (default is `ghpd.toml` in the platform configuration directory)
    #[arg(value_name = "PATH")]
    pub output: Option<Utf8PathBuf>,
}

pub fn init_config<H: Host>(host: &mut H, args: &InitArgs) -> Result<()> {
    let output = if let Some(path) = &args.output {
        path.clone()
    } else {
        Config::default_path().into_app_err("could not determine the configuration directory")?
    };

    Config::save_default(&output)?;
    let _ = writeln!(host.output(), "Generated default configuration file: {output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::host::TestHost;

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn writes_default_config() {
        let tmp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(tmp.path().join("ghpd.toml")).unwrap();
        let mut host = TestHost::new();

        init_config(&mut host, &InitArgs { output: Some(path.clone()) }).unwrap();

        assert!(host.output_text().contains("ghpd.toml"));
        assert_eq!(Config::load(Some(&path)).unwrap(), Config::default());
    }
}
