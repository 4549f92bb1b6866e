#[cfg(test)]
mod tests {
    use crate::cli::{Cli, Command};
    use clap::{CommandFactory, Parser};
    use std::path::PathBuf;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_flags() {
        let cli = Cli::parse_from([
            "cachet", "build", "--input", "web", "--output", "out", "--clean", "--minify",
        ]);
        match cli.command {
            Command::Build(args) => {
                assert_eq!(args.input, Some(PathBuf::from("web")));
                assert_eq!(args.output, Some(PathBuf::from("out")));
                assert!(args.clean);
                assert!(args.minify);
                assert!(!args.dev);
                assert_eq!(args.config, None);
            }
            _ => panic!("expected build command"),
        }
    }

    #[test]
    fn test_dev_flags() {
        let cli = Cli::parse_from(["cachet", "dev", "-p", "8080", "--host", "0.0.0.0"]);
        match cli.command {
            Command::Dev(args) => {
                assert_eq!(args.port, Some(8080));
                assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
            }
            _ => panic!("expected dev command"),
        }
    }

    #[test]
    fn test_url_requires_path() {
        assert!(Cli::try_parse_from(["cachet", "url"]).is_err());

        let cli = Cli::parse_from(["cachet", "url", "css/app.css", "--dev"]);
        match cli.command {
            Command::Url(args) => {
                assert_eq!(args.path, "css/app.css");
                assert!(args.dev);
            }
            _ => panic!("expected url command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["cachet", "manifest", "--verbose", "--no-color"]);
        assert!(cli.verbose);
        assert!(cli.no_color);
        assert!(matches!(cli.command, Command::Manifest(_)));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["cachet", "-v", "-q", "build"]).is_err());
    }
}
