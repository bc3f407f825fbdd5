//! CLI bootstrap - the composition root.
//!
//! The only place where concrete adapters are chosen and wired together:
//! - Settings: defaults, then the `--settings` file, then flags
//! - Screen adapters (capture, OCR, target) from `pageturner-screen`
//! - Speech provider from `pageturner-speech`
//! - The [`ReaderContext`] handed to the reading loop

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use pageturner_core::{
    ReaderObserver, ReaderSettings, ReaderSettingsUpdate, SpeechProvider, TargetHandle,
    validate_settings,
};
use pageturner_reader::ReaderContext;
use pageturner_screen::capture::DEFAULT_CAPTURE_TIMEOUT;
use pageturner_screen::window::default_list_command;
use pageturner_screen::{
    CommandCapture, CommandSpec, CommandTarget, TesseractConfig, TesseractExtractor, WindowInfo,
    find_window, list_windows,
};
use pageturner_speech::{AllTalkBackend, AllTalkConfig, EngineSpeechProvider, TtsBackend};

use crate::commands::{Engine, ScreenArgs, SpeechArgs, TargetArgs, WindowsArgs};
use crate::error::CliError;

/// Limit for the window-listing command.
const LIST_TIMEOUT: Duration = Duration::from_secs(5);

/// Build the session settings.
///
/// Defaults, overlaid by the settings file if given, then by `update`, then
/// validated.
pub fn load_settings(
    settings_file: Option<&Path>,
    update: &ReaderSettingsUpdate,
) -> Result<ReaderSettings, CliError> {
    let mut settings = ReaderSettings::with_defaults();
    if let Some(path) = settings_file {
        let from_file = ReaderSettings::from_json_file(path)?;
        tracing::debug!(path = %path.display(), "Loaded settings file");
        settings.overlay(&from_file);
    }
    settings.merge(update);
    validate_settings(&settings)?;
    Ok(settings)
}

/// Screen-side adapters for one session.
pub struct ScreenAdapters {
    pub capture: Arc<CommandCapture>,
    pub extractor: Arc<TesseractExtractor>,
    pub lifecycle: Arc<CommandTarget>,
}

/// Build capture, OCR and target adapters from the command-line overrides.
pub fn build_screen(args: &ScreenArgs) -> Result<ScreenAdapters, CliError> {
    let capture = match &args.capture_command {
        Some(line) => CommandCapture::new(CommandSpec::parse(line)?, DEFAULT_CAPTURE_TIMEOUT),
        None => CommandCapture::default(),
    };

    let extractor = TesseractExtractor::new(&TesseractConfig {
        program: args.tesseract.clone(),
        language: args.ocr_lang.clone(),
        page_segmentation: args.psm,
        ..TesseractConfig::default()
    });

    let mut lifecycle = CommandTarget::default();
    if let Some(line) = &args.liveness_command {
        lifecycle = lifecycle.with_liveness(CommandSpec::parse(line)?);
    }
    if let Some(line) = &args.advance_command {
        lifecycle = lifecycle.with_advance(CommandSpec::parse(line)?);
    }

    tracing::debug!(
        capture = %capture.command(),
        ocr = %extractor.command(),
        "Screen adapters ready"
    );

    Ok(ScreenAdapters {
        capture: Arc::new(capture),
        extractor: Arc::new(extractor),
        lifecycle: Arc::new(lifecycle),
    })
}

/// Build the speech provider for the selected engine.
///
/// Voice, rate and volume come from `settings` and are applied when the
/// reading loop initializes the provider.
pub fn build_speech(
    args: &SpeechArgs,
    settings: &ReaderSettings,
) -> Result<Arc<dyn SpeechProvider>, CliError> {
    let backend: Box<dyn TtsBackend> = match args.engine {
        Engine::Alltalk => {
            let mut config = AllTalkConfig {
                server_url: args.server_url.trim_end_matches('/').to_string(),
                language: args.language.clone(),
                ..AllTalkConfig::default()
            };
            if let Some(voice) = &settings.voice {
                config.voice.clone_from(voice);
            }
            Box::new(AllTalkBackend::new(config)?)
        }
        Engine::Kokoro => kokoro_backend(args, settings)?,
    };

    tracing::info!(
        engine = backend.name(),
        voice = %backend.voice(),
        "Speech engine selected"
    );
    Ok(Arc::new(
        EngineSpeechProvider::new(backend).expanding_contractions(args.expand_contractions),
    ))
}

#[cfg(feature = "sherpa")]
fn kokoro_backend(
    args: &SpeechArgs,
    settings: &ReaderSettings,
) -> Result<Box<dyn TtsBackend>, CliError> {
    use pageturner_speech::backend::sherpa_tts::{DEFAULT_KOKORO_VOICE, SherpaTtsBackend};

    let dir = args.kokoro_dir.as_deref().ok_or_else(|| {
        CliError::Arguments("--kokoro-dir is required for the kokoro engine".to_string())
    })?;
    let voice = settings.voice.as_deref().unwrap_or(DEFAULT_KOKORO_VOICE);
    let speed = settings.voice_parameters().effective_rate();
    Ok(Box::new(SherpaTtsBackend::load(dir, voice, speed)?))
}

#[cfg(not(feature = "sherpa"))]
fn kokoro_backend(
    _args: &SpeechArgs,
    _settings: &ReaderSettings,
) -> Result<Box<dyn TtsBackend>, CliError> {
    Err(CliError::Arguments(
        "the kokoro engine needs a build with the `sherpa` feature".to_string(),
    ))
}

fn list_command(line: Option<&str>) -> Result<CommandSpec, CliError> {
    match line {
        Some(line) => Ok(CommandSpec::parse(line)?),
        None => Ok(default_list_command()),
    }
}

/// List windows, optionally only those whose title contains the filter.
pub async fn windows(args: &WindowsArgs) -> Result<Vec<WindowInfo>, CliError> {
    let command = list_command(args.list_command.as_deref())?;
    let mut windows = list_windows(&command, LIST_TIMEOUT).await?;
    if let Some(filter) = &args.filter {
        let filter = filter.to_lowercase();
        windows.retain(|w| w.title.to_lowercase().contains(&filter));
    }
    Ok(windows)
}

/// Resolve the window to read from `--window-id` or a title query.
pub async fn resolve_target(args: &TargetArgs) -> Result<(TargetHandle, String), CliError> {
    if let Some(id) = &args.window_id {
        return Ok((TargetHandle::new(id.clone()), id.clone()));
    }
    let query = args.query.as_deref().ok_or_else(|| {
        CliError::Arguments("give a window title or --window-id".to_string())
    })?;

    let command = list_command(args.list_command.as_deref())?;
    let windows = list_windows(&command, LIST_TIMEOUT).await?;
    let found = find_window(&windows, query)
        .ok_or_else(|| CliError::WindowNotFound(query.to_string()))?;
    tracing::debug!(window_id = %found.id, title = %found.title, "Window resolved");
    Ok((found.handle(), found.title.clone()))
}

/// Assemble the per-session context.
pub fn build_context(
    target: TargetHandle,
    screen: &ScreenAdapters,
    speech: Arc<dyn SpeechProvider>,
    observer: Arc<dyn ReaderObserver>,
) -> ReaderContext {
    ReaderContext::new(
        target,
        screen.capture.clone(),
        screen.extractor.clone(),
        speech,
        screen.lifecycle.clone(),
    )
    .with_observer(observer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageturner_core::CropInsets;

    fn screen_args() -> ScreenArgs {
        ScreenArgs {
            crop: None,
            capture_command: None,
            advance_command: None,
            liveness_command: None,
            tesseract: "tesseract".to_string(),
            ocr_lang: "eng".to_string(),
            psm: 3,
        }
    }

    #[test]
    fn test_settings_defaults_validate() {
        let settings = load_settings(None, &ReaderSettingsUpdate::default()).unwrap();
        assert_eq!(settings, ReaderSettings::with_defaults());
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"advance_ratio": 0.5, "volume": 40, "crop": {"left": 1, "top": 2, "right": 3, "bottom": 4}}"#,
        )
        .unwrap();

        let update = ReaderSettingsUpdate {
            volume: Some(90),
            ..ReaderSettingsUpdate::default()
        };
        let settings = load_settings(Some(&path), &update).unwrap();
        assert_eq!(settings.advance_ratio, Some(0.5));
        assert_eq!(settings.volume, Some(90));
        assert_eq!(settings.crop, Some(CropInsets::new(1, 2, 3, 4)));
        assert_eq!(settings.speech_rate, Some(1.0));
    }

    #[test]
    fn test_out_of_range_flag_rejected() {
        let update = ReaderSettingsUpdate {
            advance_ratio: Some(1.5),
            ..ReaderSettingsUpdate::default()
        };
        let err = load_settings(None, &update).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_missing_settings_file() {
        let err = load_settings(
            Some(Path::new("/nonexistent/pageturner.json")),
            &ReaderSettingsUpdate::default(),
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn test_screen_overrides() {
        let args = ScreenArgs {
            capture_command: Some("grim -g '{window}' -".to_string()),
            advance_command: Some("xdotool key --window {window} Next".to_string()),
            ..screen_args()
        };
        let screen = build_screen(&args).unwrap();
        assert_eq!(screen.capture.command().to_string(), "grim -g {window} -");
        assert_eq!(
            screen.lifecycle.advance().to_string(),
            "xdotool key --window {window} Next"
        );
    }

    #[test]
    fn test_unterminated_quote_is_process_error() {
        let args = ScreenArgs {
            capture_command: Some("import -window '{window}".to_string()),
            ..screen_args()
        };
        assert!(matches!(build_screen(&args), Err(CliError::Process(_))));
    }

    #[tokio::test]
    async fn test_window_id_skips_listing() {
        let args = TargetArgs {
            query: None,
            window_id: Some("0x2a".to_string()),
            list_command: Some("false".to_string()),
        };
        let (handle, label) = resolve_target(&args).await.unwrap();
        assert_eq!(handle, TargetHandle::new("0x2a"));
        assert_eq!(label, "0x2a");
    }

    #[tokio::test]
    async fn test_target_needs_query_or_id() {
        let args = TargetArgs {
            query: None,
            window_id: None,
            list_command: None,
        };
        assert!(matches!(
            resolve_target(&args).await,
            Err(CliError::Arguments(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_query_resolved_through_list_command() {
        let list = "printf '0x1 0 host Terminal\\n0x2 0 host Kindle - Dune\\n'";
        let args = TargetArgs {
            query: Some("dune".to_string()),
            window_id: None,
            list_command: Some(format!("sh -c \"{list}\"")),
        };
        let (handle, title) = resolve_target(&args).await.unwrap();
        assert_eq!(handle, TargetHandle::new("0x2"));
        assert_eq!(title, "Kindle - Dune");

        let missing = TargetArgs {
            query: Some("calibre".to_string()),
            ..args
        };
        assert!(matches!(
            resolve_target(&missing).await,
            Err(CliError::WindowNotFound(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_windows_filter() {
        let list = "printf '0x1 0 host Terminal\\n0x2 0 host Kindle - Dune\\n'";
        let args = WindowsArgs {
            filter: Some("KINDLE".to_string()),
            list_command: Some(format!("sh -c \"{list}\"")),
            json: false,
        };
        let found = windows(&args).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "0x2");
    }
}
