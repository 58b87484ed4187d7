use std::fs::File;
use std::path::Path;
use std::time::Duration;

use annogen_gen::{GenError, Generator, Task, TaskOutcome};
use pretty_assertions::assert_eq;

const HEADER: &str = r#"#pragma once
#include <stdint.h>

/// Primary colors.
enum __attribute__((annotate("binding"))) Color {
    RED,
    BLUE,
    GREEN
};

struct __attribute__((annotate("binding"))) Vec2 {
    float x; ///< Horizontal
    float y;
    int debug_id __attribute__((annotate("hidden")));
};

/**
 * @brief Scales a vector.
 * @param v The vector.
 * @param factor Scale factor.
 */
struct Vec2 __attribute__((annotate("binding"))) scale(struct Vec2 v, float factor);

void internal_only(int a);
"#;

const STUB_TEMPLATE: &str = "\
{% for e in enums %}class {{ e.name }}:
{% for c in e.constants %}    {{ c.name }} = {{ c.value }}
{% endfor %}{% endfor %}\
{% for s in structs %}class {{ s.name }}:
{% for f in s.fields %}    {{ f.name }}: {{ c_type(f.type) }}
{% endfor %}{% endfor %}\
{% for f in functions %}def {{ f.name }}({{ params(f) }}) -> {{ c_type(f.return_type) }}:
{{ doc_block(f.comment) }}
    ...
{% endfor %}";

const EXPECTED_STUB: &str = "\
class Color:
    RED = 0
    BLUE = 1
    GREEN = 2
class Vec2:
    x: float
    y: float
def scale(v: Vec2, factor: float) -> Vec2:
    \"\"\"
    :brief Scales a vector.
    :param v The vector.
    :param factor Scale factor.
    \"\"\"
    ...
";

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    std::fs::read_to_string(root.join(rel)).unwrap()
}

/// Push a file's modification time into the future.
fn touch_later(path: &Path) {
    let mtime = std::fs::metadata(path).unwrap().modified().unwrap();
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(mtime + Duration::from_secs(10)).unwrap();
}

fn project() -> (tempfile::TempDir, Generator) {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "include/engine.h", HEADER);
    write(dir.path(), "include/engine/detail.h", "int detail;");
    write(dir.path(), "templates/stub.pyi.j2", STUB_TEMPLATE);
    let generator = Generator::new(dir.path(), ".annogen/stamps");
    (dir, generator)
}

fn stub_task() -> Task {
    Task::new("templates/stub.pyi.j2")
        .with_source("include/engine.h")
        .with_output("out/engine.pyi")
}

#[test]
fn renders_bound_entities() {
    let (dir, generator) = project();
    let outcome = generator.run_task(&stub_task()).unwrap();

    assert_eq!(
        outcome,
        TaskOutcome::Generated {
            written: vec!["out/engine.pyi".into()],
            kept: vec![],
        }
    );
    let stub = read(dir.path(), "out/engine.pyi");
    assert_eq!(stub, EXPECTED_STUB);
    assert!(!stub.contains("internal_only"));
    assert!(!stub.contains("debug_id"));
}

#[test]
fn second_run_is_skipped() {
    let (dir, generator) = project();
    let task = stub_task();

    assert!(!generator.run_task(&task).unwrap().is_skipped());
    let first = read(dir.path(), "out/engine.pyi");
    let output = dir.path().join("out/engine.pyi");
    let written_at = std::fs::metadata(&output).unwrap().modified().unwrap();

    assert!(generator.run_task(&task).unwrap().is_skipped());
    assert_eq!(read(dir.path(), "out/engine.pyi"), first);
    assert_eq!(
        std::fs::metadata(&output).unwrap().modified().unwrap(),
        written_at
    );
}

#[test]
fn source_is_never_stamped() {
    let (dir, generator) = project();
    let task = stub_task();
    generator.run_task(&task).unwrap();

    assert!(!generator
        .stamps()
        .stamp_path(Path::new("include/engine.h"))
        .exists());
    assert!(generator
        .stamps()
        .stamp_path(Path::new("templates/stub.pyi.j2"))
        .exists());

    // Without a dependency folder covering it, a header edit alone does not
    // make the task stale.
    touch_later(&dir.path().join("include/engine.h"));
    assert!(generator.run_task(&task).unwrap().is_skipped());
}

#[test]
fn modified_template_regenerates() {
    let (dir, generator) = project();
    let task = stub_task();
    generator.run_task(&task).unwrap();

    write(dir.path(), "templates/stub.pyi.j2", "{{ functions | length }}\n");
    touch_later(&dir.path().join("templates/stub.pyi.j2"));

    assert!(!generator.run_task(&task).unwrap().is_skipped());
    assert_eq!(read(dir.path(), "out/engine.pyi"), "1\n");
}

#[test]
fn missing_output_regenerates() {
    let (dir, generator) = project();
    let task = stub_task();
    generator.run_task(&task).unwrap();

    std::fs::remove_file(dir.path().join("out/engine.pyi")).unwrap();
    assert!(!generator.run_task(&task).unwrap().is_skipped());
    assert_eq!(read(dir.path(), "out/engine.pyi"), EXPECTED_STUB);
}

#[test]
fn modified_dependency_regenerates() {
    let (dir, generator) = project();
    let task = stub_task().with_dependencies(["include"], [".h"]);

    generator.run_task(&task).unwrap();
    assert!(generator
        .stamps()
        .stamp_path(Path::new("include/engine/detail.h"))
        .exists());
    assert!(generator.run_task(&task).unwrap().is_skipped());

    touch_later(&dir.path().join("include/engine/detail.h"));
    assert!(!generator.run_task(&task).unwrap().is_skipped());
    assert!(generator.run_task(&task).unwrap().is_skipped());
}

#[test]
fn missing_dependency_folder_is_not_fatal() {
    let (_dir, generator) = project();
    let task = stub_task().with_dependencies(["does/not/exist"], [".h"]);
    assert!(!generator.run_task(&task).unwrap().is_skipped());
    assert!(generator.run_task(&task).unwrap().is_skipped());
}

#[test]
fn outputs_share_one_render() {
    let (dir, generator) = project();
    let task = stub_task().with_output("mirror/engine.pyi");
    generator.run_task(&task).unwrap();
    assert_eq!(
        read(dir.path(), "out/engine.pyi"),
        read(dir.path(), "mirror/engine.pyi")
    );
}

#[test]
fn skip_if_exists_keeps_only_that_output() {
    let (dir, generator) = project();
    write(dir.path(), "out/user.pyi", "hand edited\n");
    let task = stub_task().with_kept_output("out/user.pyi");

    let outcome = generator.run_task(&task).unwrap();
    assert_eq!(
        outcome,
        TaskOutcome::Generated {
            written: vec!["out/engine.pyi".into()],
            kept: vec!["out/user.pyi".into()],
        }
    );
    assert_eq!(read(dir.path(), "out/user.pyi"), "hand edited\n");
    assert_eq!(read(dir.path(), "out/engine.pyi"), EXPECTED_STUB);
}

#[test]
fn template_only_task_writes_beside_template() {
    let (dir, mut generator) = project();
    generator.set_global("EDITOR_NAME", "meed");
    write(
        dir.path(),
        "config/editor.cfg.in",
        "name={{ EDITOR_NAME }}\ndefine={{ PLATFORM_DEFINE }}\nstructs={{ structs | length }}\n",
    );

    let task = Task::new("config/editor.cfg.in");
    generator.run_task(&task).unwrap();

    let cfg = read(dir.path(), "config/editor.cfg");
    assert!(cfg.starts_with("name=meed\ndefine=PLATFORM_IS_"));
    assert!(cfg.ends_with("structs=0\n"));
}

#[test]
fn templates_can_include_files_from_base_dir() {
    let (dir, generator) = project();
    write(dir.path(), "templates/header.j2", "// generated\n");
    write(
        dir.path(),
        "templates/main.j2",
        "{% include 'templates/header.j2' %}{{ custom_types | join(' ') }}\n",
    );
    let task = Task::new("templates/main.j2")
        .with_source("include/engine.h")
        .with_output("out/main.txt");
    generator.run_task(&task).unwrap();
    assert_eq!(read(dir.path(), "out/main.txt"), "// generated\nColor Vec2\n");
}

#[test]
fn earlier_task_can_generate_a_later_source() {
    let (dir, generator) = project();
    write(
        dir.path(),
        "api.h.in",
        "int __attribute__((annotate(\"binding\"))) {{ PLATFORM | lower }}_answer(void);\n",
    );
    write(dir.path(), "names.j2", "{% for f in functions %}{{ f.name }}\n{% endfor %}");
    let tasks = vec![
        Task::new("api.h.in"),
        Task::new("names.j2")
            .with_source("api.h")
            .with_output("out/names.txt"),
    ];

    let outcomes = generator.run(&tasks).unwrap();
    assert!(outcomes.iter().all(|o| !o.is_skipped()));
    let names = read(dir.path(), "out/names.txt");
    assert!(names.ends_with("_answer\n"));
}

#[test]
fn missing_source_stops_at_that_task() {
    let (dir, generator) = project();
    let tasks = vec![
        stub_task(),
        Task::new("templates/stub.pyi.j2")
            .with_source("include/missing.h")
            .with_output("out/missing.pyi"),
        Task::new("templates/stub.pyi.j2")
            .with_source("include/engine.h")
            .with_output("out/after.pyi"),
    ];

    let err = generator.run(&tasks).unwrap_err();
    assert!(matches!(err, GenError::MissingSource { .. }));
    assert!(dir.path().join("out/engine.pyi").exists());
    assert!(!dir.path().join("out/after.pyi").exists());
}

#[test]
fn misconfigured_task_aborts_before_any_output() {
    let (dir, generator) = project();
    let mut no_extensions = stub_task().with_output("out/second.pyi");
    no_extensions.dependencies = Some(vec!["include".into()]);
    let tasks = vec![stub_task(), no_extensions];

    let err = generator.run(&tasks).unwrap_err();
    assert!(matches!(err, GenError::DependenciesWithoutExtensions { .. }));
    assert!(!dir.path().join("out/engine.pyi").exists());
}

#[test]
fn fatal_preconditions() {
    let (_dir, generator) = project();

    let missing_template = Task::new("templates/none.j2")
        .with_source("include/engine.h")
        .with_output("out/x");
    assert!(matches!(
        generator.run_task(&missing_template),
        Err(GenError::MissingTemplate { .. })
    ));

    let mut no_extensions = stub_task();
    no_extensions.dependencies = Some(vec!["include".into()]);
    let err = generator.run_task(&no_extensions).unwrap_err();
    assert!(matches!(err, GenError::DependenciesWithoutExtensions { .. }));
    assert!(err.to_string().contains("include/engine.h"));
}

#[test]
fn parse_errors_name_the_header() {
    let (dir, generator) = project();
    write(dir.path(), "include/broken.h", "struct Broken { int x;\n");
    let task = Task::new("templates/stub.pyi.j2")
        .with_source("include/broken.h")
        .with_output("out/broken.pyi");

    let err = generator.run_task(&task).unwrap_err();
    assert!(matches!(err, GenError::Parse { .. }));
    assert!(err.to_string().contains("include/broken.h"));
}

#[test]
fn clear_cache_forces_regeneration() {
    let (_dir, generator) = project();
    let tasks = vec![stub_task()];

    generator.run(&tasks).unwrap();
    assert!(generator.run(&tasks).unwrap()[0].is_skipped());

    assert!(generator.clear_cache().unwrap());
    assert_eq!(generator.stamps().count(), 0);
    assert!(!generator.run(&tasks).unwrap()[0].is_skipped());
}
