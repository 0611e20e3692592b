use super::*;

#[test]
fn quality_flags_and_folders_line_up() {
    for q in [
        Quality::Low,
        Quality::Medium,
        Quality::High,
        Quality::Production,
        Quality::FourK,
    ] {
        assert_eq!(Quality::from_engine_flag(q.engine_flag()).unwrap(), q);
    }
    assert_eq!(Quality::default().resolution_folder(), "720p30");
    assert_eq!(Quality::High.resolution_folder(), "1080p60");
    assert!(Quality::from_engine_flag("-qx").is_err());
}

#[test]
fn layout_paths_follow_project_conventions() {
    let layout = ProjectLayout::new("/work");
    assert_eq!(
        layout.source_file("fourier"),
        PathBuf::from("/work/projects/fourier/animation.py")
    );
    assert_eq!(
        layout.unit_workspace("fourier", "Scene01_Intro"),
        PathBuf::from("/work/projects/fourier/temp_media/Scene01_Intro")
    );
    assert_eq!(
        layout.unit_video("fourier", "Scene01_Intro", Quality::Medium),
        PathBuf::from("/work/projects/fourier/media/videos/animation/720p30/Scene01_Intro.mp4")
    );
    assert_eq!(
        layout.audio_map_file("fourier"),
        PathBuf::from("/work/projects/fourier/media/audio/audio_map.json")
    );
    assert_eq!(
        layout.merged_output("fourier"),
        PathBuf::from("/work/outputs/fourier.mp4")
    );
}

#[test]
fn source_stem_falls_back_for_bare_paths() {
    assert_eq!(source_stem(Path::new("a/b/lesson.py")), "lesson");
    assert_eq!(source_stem(Path::new("/")), "animation");
}
