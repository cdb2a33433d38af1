use super::*;
use clap::Parser;

#[test]
fn serve_defaults_to_localhost_5000() {
    let cli = Cli::try_parse_from(["mdlens", "serve", "docs"]).expect("parse");
    assert!(!cli.debug);
    match cli.command {
        Commands::Serve(ServeArgs {
            directory,
            host,
            port,
        }) => {
            assert_eq!(directory.to_str(), Some("docs"));
            assert_eq!(host, "127.0.0.1");
            assert_eq!(port, 5000);
        }
        _ => panic!("expected serve command"),
    }
}

#[test]
fn debug_flag_is_accepted_after_the_subcommand() {
    let cli = Cli::try_parse_from(["mdlens", "serve", "docs", "--port", "8080", "--debug"])
        .expect("parse");
    assert!(cli.debug);
    assert!(matches!(cli.command, Commands::Serve(ServeArgs { port: 8080, .. })));
}

#[test]
fn search_collects_words_and_rejects_zero_limit() {
    let cli = Cli::try_parse_from(["mdlens", "search", "docs", "cache", "dir", "--limit", "3"])
        .expect("parse");
    match cli.command {
        Commands::Search(SearchArgs {
            words, word, limit, ..
        }) => {
            assert_eq!(words, vec!["cache".to_string(), "dir".to_string()]);
            assert!(!word);
            assert_eq!(limit, Some(3));
        }
        _ => panic!("expected search command"),
    }

    assert!(Cli::try_parse_from(["mdlens", "search", "docs", "x", "--limit", "0"]).is_err());
    assert!(Cli::try_parse_from(["mdlens", "search", "docs"]).is_err());
}

#[test]
fn locate_requires_query_and_keeps_optional_context() {
    let cli = Cli::try_parse_from([
        "mdlens",
        "locate",
        "guide.md",
        "--query",
        "cache",
        "--context",
        "configure the cache",
    ])
    .expect("parse");
    match cli.command {
        Commands::Locate(LocateArgs { query, context, .. }) => {
            assert_eq!(query, "cache");
            assert_eq!(context.as_deref(), Some("configure the cache"));
        }
        _ => panic!("expected locate command"),
    }

    assert!(Cli::try_parse_from(["mdlens", "locate", "guide.md"]).is_err());
}

#[test]
fn search_word_flag_parses() {
    let cli = Cli::try_parse_from(["mdlens", "search", "docs", "cache", "--word"]).expect("parse");
    assert!(matches!(
        cli.command,
        Commands::Search(SearchArgs {
            word: true,
            limit: None,
            ..
        })
    ));
}
