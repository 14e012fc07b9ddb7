use clap::Parser;
use std::path::PathBuf;

use setk::cli::commands::examples::ExamplesCommands;
use setk::cli::{Cli, Commands};

#[test]
fn test_parse_generate_flags() {
    let cli = Cli::try_parse_from([
        "setk",
        "generate",
        "--subject",
        "수학",
        "--midterm",
        "85",
        "--final",
        "92",
        "--notes",
        "수업 태도 우수",
        "--level",
        "고등학교",
        "--student-id",
        "7",
    ])
    .unwrap();

    match cli.command {
        Commands::Generate(args) => {
            let input = args.to_input().unwrap();
            assert_eq!(input.subject, "수학");
            assert_eq!(input.midterm_score, Some(85));
            assert_eq!(input.final_score, Some(92));
            assert_eq!(input.additional_notes.as_deref(), Some("수업 태도 우수"));
            assert_eq!(input.school_level.as_deref(), Some("고등학교"));
            assert_eq!(input.student_id, Some(7));
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_input_file_conflicts_with_flags() {
    let result = Cli::try_parse_from([
        "setk", "generate", "--input", "student.json", "--subject", "수학",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_parse_batch_with_globals() {
    let cli = Cli::try_parse_from([
        "setk",
        "--config",
        "ci.yaml",
        "batch",
        "students.yaml",
        "--concurrency",
        "4",
        "--model",
        "ollama:gpt-oss:20b",
    ])
    .unwrap();

    assert_eq!(cli.config, Some(PathBuf::from("ci.yaml")));
    assert_eq!(cli.model.as_deref(), Some("ollama:gpt-oss:20b"));
    match cli.command {
        Commands::Batch(args) => {
            assert_eq!(args.file, PathBuf::from("students.yaml"));
            assert_eq!(args.concurrency, Some(4));
            assert!(args.output.is_none());
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_examples_search() {
    let cli = Cli::try_parse_from([
        "setk", "examples", "search", "--subject", "물리", "-k", "5", "--diverse",
    ])
    .unwrap();

    match cli.command {
        Commands::Examples(args) => match args.command {
            ExamplesCommands::Search(search) => {
                assert_eq!(search.subject, "물리");
                assert_eq!(search.k, Some(5));
                assert!(search.diverse);
            }
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_init_force() {
    let cli = Cli::try_parse_from(["setk", "init", "--force"]).unwrap();
    match cli.command {
        Commands::Init(args) => {
            assert!(args.force);
            assert_eq!(args.path, PathBuf::from("."));
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_subject_flag_required_for_search() {
    assert!(Cli::try_parse_from(["setk", "examples", "search"]).is_err());
}
