use std::path::Path;

use as3lsp::analysis::rename::RenameOutcome;
use as3lsp::analysis::{AnalysisOptions, Context, Resolver};
use as3lsp::error::Cancelled;
use as3lsp::project::{DefId, Keyword, NodeKind, ProjectProvider, UnitId};
use as3lsp::snapshot::{ProjectModel, SnapshotBuilder, SnapshotProvider};
use as3lsp::{definition, rename, Dialect, LineIndex, SourceDocument};
use expect_test::{expect, Expect};
use tokio_util::sync::CancellationToken;
use tower_lsp::lsp_types::{GotoDefinitionResponse, Location, Position, Range, TextEdit};

// ---------------------------------------------------------------------------
// Fixture project
// ---------------------------------------------------------------------------

const SHAPE: &str = "package shapes {
/**
 * Base of every shape.
 * @see Circle#draw()
 * @see #area
 */
public class Shape {
public var area;
public function draw() {
}
}
}
";

const CIRCLE: &str = "package shapes {
public class Circle extends Shape {
private var radius;
public function Circle() {
super();
radius = 1;
}
override public function draw() {
var self = this;
}
}
}
";

const MAIN: &str = "package {
import shapes.Circle;
public class Main {
public function Main() {
var c = new Circle();
c.draw();
}
}
}
";

const APP: &str = r#"<s:Application xmlns:fx="http://ns.adobe.com/mxml/2009" xmlns:s="library://ns.adobe.com/flex/spark" xmlns:shapes="shapes.*">
  <fx:Script source="includes/setup.as"/>
  <fx:Script><![CDATA[
    var c:Circle = new Circle();
  ]]></fx:Script>
  <shapes:Circle id="wheel"/>
  <s:Button label="Spin" click="{wheel.draw()}"/>
</s:Application>
"#;

/// Shapes in a package, a script consumer and an MXML application.
fn project() -> ProjectModel {
    let mut b = SnapshotBuilder::new();

    let shape_unit = b.script("/src/shapes/Shape.as", SHAPE);
    let shapes = b.package(shape_unit, "shapes");
    b.reference(shape_unit, "shapes", 0, Some(shapes));
    let shape = b.class(shape_unit, Some(shapes), "Shape");
    b.field(shape_unit, shape, "area");
    let shape_draw = b.method(shape_unit, shape, "draw");
    b.doc_comment(shape_unit, 0);

    let circle_unit = b.script("/src/shapes/Circle.as", CIRCLE);
    let shapes = b.package(circle_unit, "shapes");
    let circle = b.class(circle_unit, Some(shapes), "Circle");
    b.extends(circle_unit, circle, shape);
    b.constructor(circle_unit, circle);
    let radius = b.field(circle_unit, circle, "radius");
    b.reference(circle_unit, "radius", 1, Some(radius));
    let circle_draw = b.method(circle_unit, circle, "draw");
    b.overrides(circle_draw, shape_draw);
    keyword(&mut b, circle_unit, "super", Keyword::Super);
    keyword(&mut b, circle_unit, "this", Keyword::This);

    let main_unit = b.script("/src/Main.as", MAIN);
    let root = b.package(main_unit, "");
    let main = b.class(main_unit, Some(root), "Main");
    b.constructor(main_unit, main);
    b.reference(main_unit, "Circle", 0, Some(circle));
    new_call(&mut b, main_unit, circle);
    b.reference(main_unit, "draw", 0, Some(circle_draw));

    let app_unit = b.markup("/src/App.mxml", APP);
    let root = b.package(app_unit, "");
    let app = b.markup_class(app_unit, Some(root), "App");
    b.reference(app_unit, "Circle", 0, Some(circle));
    new_call(&mut b, app_unit, circle);
    let wheel_tag = b.tag(app_unit, "Circle", 0);
    b.bind_tag(app_unit, wheel_tag, circle);
    let wheel = b.id_field(app_unit, app, "wheel");
    b.reference(app_unit, "wheel", 1, Some(wheel));
    b.reference(app_unit, "draw", 0, Some(circle_draw));
    let button = b.library_class("/libs/spark.swc", "spark.components", "Button");
    let button_tag = b.tag(app_unit, "Button", 0);
    b.bind_tag(app_unit, button_tag, button);

    b.build()
}

fn keyword(b: &mut SnapshotBuilder, unit: UnitId, word: &str, keyword: Keyword) {
    let span = b.span_of(unit, word, 0);
    b.node(unit, NodeKind::Keyword { keyword }, span);
}

/// `new Circle()`; the class name is the second `Circle` of each fixture.
fn new_call(b: &mut SnapshotBuilder, unit: UnitId, class: DefId) {
    let span = b.span_of(unit, "new Circle()", 0);
    b.node(unit, NodeKind::Call { is_new: true }, span);
    b.reference(unit, "Circle", 1, Some(class));
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn document(path: &str) -> SourceDocument {
    let text = match path {
        "/src/shapes/Shape.as" => SHAPE,
        "/src/shapes/Circle.as" => CIRCLE,
        "/src/Main.as" => MAIN,
        "/src/App.mxml" => APP,
        _ => "package {\n}\n",
    };
    let dialect = Dialect::from_path(Path::new(path), &AnalysisOptions::default().markup_extensions);
    SourceDocument::new(path.into(), dialect, text)
}

fn format_range(range: &Range) -> String {
    format!(
        "{}:{}-{}:{}",
        range.start.line, range.start.character, range.end.line, range.end.character
    )
}

fn format_location(location: &Location) -> String {
    format!("{} {}", location.uri.path(), format_range(&location.range))
}

/// One line per target; links are prefixed with the origin range.
fn format_definition(response: &GotoDefinitionResponse) -> String {
    let lines: Vec<String> = match response {
        GotoDefinitionResponse::Scalar(location) => vec![format_location(location)],
        GotoDefinitionResponse::Array(locations) => locations.iter().map(format_location).collect(),
        GotoDefinitionResponse::Link(links) => links
            .iter()
            .map(|link| {
                let origin = link
                    .origin_selection_range
                    .as_ref()
                    .map_or_else(|| "?".to_string(), format_range);
                format!(
                    "{origin} -> {} {}",
                    link.target_uri.path(),
                    format_range(&link.target_selection_range)
                )
            })
            .collect(),
    };
    if lines.is_empty() {
        "no definition".to_string()
    } else {
        lines.join("\n")
    }
}

fn format_rename(outcome: &RenameOutcome) -> String {
    match outcome {
        RenameOutcome::Edit(plan) => {
            let mut lines: Vec<String> = plan
                .documents
                .iter()
                .map(|doc| {
                    let ranges: Vec<String> =
                        doc.edits.iter().map(|edit| format_range(&edit.range)).collect();
                    format!("{}: {}", doc.path.display(), ranges.join(", "))
                })
                .collect();
            if let Some(file) = &plan.file_rename {
                lines.push(format!(
                    "rename {} -> {}",
                    file.from.display(),
                    file.to.display()
                ));
            }
            if lines.is_empty() {
                "no edits".to_string()
            } else {
                lines.join("\n")
            }
        }
        RenameOutcome::Refused(refusal) => format!("refused: {refusal:?}"),
        RenameOutcome::NoTarget => "no target".to_string(),
        RenameOutcome::Unresolved => "unresolved".to_string(),
    }
}

fn check_definition(model: &ProjectModel, path: &str, line: u32, character: u32, expected: Expect) {
    let options = AnalysisOptions::default();
    let cancel = CancellationToken::new();
    let ctx = Context::new(model, &options, &cancel);
    let response = definition(&ctx, &document(path), Position::new(line, character))
        .expect("request is not cancelled");
    expected.assert_eq(&format_definition(&response));
}

fn check_rename(model: &ProjectModel, path: &str, line: u32, character: u32, new_name: &str, expected: Expect) {
    let options = AnalysisOptions::default();
    let cancel = CancellationToken::new();
    let ctx = Context::new(model, &options, &cancel);
    let outcome = rename(&ctx, &document(path), Position::new(line, character), new_name)
        .expect("request is not cancelled");
    expected.assert_eq(&format_rename(&outcome));
}

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

#[test]
fn definition_of_whitespace_is_empty() {
    let model = project();
    check_definition(&model, "/src/Main.as", 0, 7, expect![[r#"no definition"#]]);
    check_definition(&model, "/src/Main.as", 30, 0, expect![[r#"no definition"#]]);
}

#[test]
fn definition_of_class_reference() {
    let model = project();
    check_definition(
        &model,
        "/src/Main.as",
        1,
        16,
        expect![[r#"/src/shapes/Circle.as 1:13-1:19"#]],
    );
}

#[test]
fn definition_of_new_expression_is_constructor() {
    let model = project();
    check_definition(
        &model,
        "/src/Main.as",
        4,
        14,
        expect![[r#"/src/shapes/Circle.as 3:16-3:22"#]],
    );
}

#[test]
fn definition_of_override_call_is_the_override() {
    let model = project();
    check_definition(
        &model,
        "/src/Main.as",
        5,
        3,
        expect![[r#"/src/shapes/Circle.as 7:25-7:29"#]],
    );
}

#[test]
fn definition_of_this_and_super() {
    let model = project();
    check_definition(
        &model,
        "/src/shapes/Circle.as",
        4,
        1,
        expect![[r#"/src/shapes/Shape.as 6:13-6:18"#]],
    );
    check_definition(
        &model,
        "/src/shapes/Circle.as",
        8,
        12,
        expect![[r#"/src/shapes/Circle.as 1:13-1:19"#]],
    );
}

#[test]
fn definition_of_doc_comment_references() {
    let model = project();
    check_definition(
        &model,
        "/src/shapes/Shape.as",
        3,
        10,
        expect![[r#"3:8-3:21 -> /src/shapes/Circle.as 7:25-7:29"#]],
    );
    check_definition(
        &model,
        "/src/shapes/Shape.as",
        4,
        9,
        expect![[r#"4:8-4:13 -> /src/shapes/Shape.as 7:11-7:15"#]],
    );
    // Prose in the comment body is not a reference.
    check_definition(&model, "/src/shapes/Shape.as", 2, 5, expect![[r#"no definition"#]]);
}

#[test]
fn definition_in_markup() {
    let model = project();
    // Component tag name.
    check_definition(
        &model,
        "/src/App.mxml",
        5,
        12,
        expect![[r#"/src/shapes/Circle.as 1:13-1:19"#]],
    );
    // Embedded script.
    check_definition(
        &model,
        "/src/App.mxml",
        3,
        25,
        expect![[r#"/src/shapes/Circle.as 3:16-3:22"#]],
    );
    // Binding expression.
    check_definition(
        &model,
        "/src/App.mxml",
        6,
        35,
        expect![[r#"/src/App.mxml 5:21-5:26"#]],
    );
    // External script file.
    check_definition(
        &model,
        "/src/App.mxml",
        1,
        24,
        expect![[r#"/src/includes/setup.as 0:0-0:0"#]],
    );
    // Namespace prefix.
    check_definition(&model, "/src/App.mxml", 5, 4, expect![[r#"no definition"#]]);
}

// ---------------------------------------------------------------------------
// Rename
// ---------------------------------------------------------------------------

#[test]
fn rename_class_across_script_and_markup() {
    let model = project();
    check_rename(
        &model,
        "/src/Main.as",
        1,
        16,
        "Ring",
        expect![[r#"
            /src/shapes/Circle.as: 1:13-1:19, 3:16-3:22
            /src/Main.as: 1:14-1:20, 4:12-4:18
            /src/App.mxml: 3:10-3:16, 3:23-3:29, 5:10-5:16
            rename /src/shapes/Circle.as -> /src/shapes/Ring.as"#]],
    );
}

#[test]
fn rename_override_renames_the_base() {
    let model = project();
    check_rename(
        &model,
        "/src/App.mxml",
        6,
        40,
        "render",
        expect![[r#"
            /src/shapes/Shape.as: 8:16-8:20
            /src/shapes/Circle.as: 7:25-7:29
            /src/Main.as: 5:2-5:6
            /src/App.mxml: 6:39-6:43"#]],
    );
}

#[test]
fn rename_private_field_stays_in_its_file() {
    let model = project();
    check_rename(
        &model,
        "/src/shapes/Circle.as",
        5,
        2,
        "size",
        expect![[r#"/src/shapes/Circle.as: 2:12-2:18, 5:0-5:6"#]],
    );
}

#[test]
fn rename_markup_id() {
    let model = project();
    check_rename(
        &model,
        "/src/App.mxml",
        5,
        23,
        "tyre",
        expect![[r#"/src/App.mxml: 5:21-5:26, 6:33-6:38"#]],
    );
}

#[test]
fn rename_refusals() {
    let model = project();
    // `Button` comes from a library.
    check_rename(&model, "/src/App.mxml", 6, 6, "Knob", expect![[r#"refused: CompiledLibrary"#]]);
    // The package name.
    check_rename(&model, "/src/shapes/Shape.as", 0, 10, "forms", expect![[r#"refused: Package"#]]);
    // Plain attribute values name nothing.
    check_rename(&model, "/src/App.mxml", 6, 20, "Stop", expect![[r#"no target"#]]);
}

#[test]
fn files_outside_the_project_use_the_fallback() {
    let provider = SnapshotProvider::new(project());
    let path = Path::new("/elsewhere/Util.as");
    let project = provider.project_for_source(path).expect("fallback project");
    assert!(project.is_fallback());

    let options = AnalysisOptions::default();
    let cancel = CancellationToken::new();
    let ctx = Context::new(project.as_ref(), &options, &cancel);
    let doc = document("/elsewhere/Util.as");
    let outcome = rename(&ctx, &doc, Position::new(0, 2), "Tool").unwrap();
    expect![[r#"refused: FallbackProject"#]].assert_eq(&format_rename(&outcome));
    let response = definition(&ctx, &doc, Position::new(0, 2)).unwrap();
    expect![[r#"no definition"#]].assert_eq(&format_definition(&response));

    let owned = provider
        .project_for_source(Path::new("/src/Main.as"))
        .expect("snapshot project");
    assert!(!owned.is_fallback());
}

#[test]
fn cancelled_requests_stop() {
    let model = project();
    let options = AnalysisOptions::default();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let ctx = Context::new(&model, &options, &cancel);
    let doc = document("/src/Main.as");
    assert_eq!(definition(&ctx, &doc, Position::new(1, 16)), Err(Cancelled));
    assert_eq!(rename(&ctx, &doc, Position::new(1, 16), "Ring"), Err(Cancelled));
}

// ---------------------------------------------------------------------------
// Resolver fallbacks and local scope
// ---------------------------------------------------------------------------

const FACTORY: &str = "package {
public class Factory {
public var kind = shapes.Circle;
public function run() {
function step() {
}
step();
}
}
}
";

/// `shapes.Circle` is left unresolved by the compiler.
fn factory() -> ProjectModel {
    let mut b = SnapshotBuilder::new();
    let circle_unit = b.script("/src/shapes/Circle.as", CIRCLE);
    let shapes = b.package(circle_unit, "shapes");
    b.class(circle_unit, Some(shapes), "Circle");

    let unit = b.script("/src/Factory.as", FACTORY);
    let root = b.package(unit, "");
    let factory = b.class(unit, Some(root), "Factory");
    let run = b.method(unit, factory, "run");
    let step = b.local_function(unit, run, "step");
    b.reference(unit, "step", 1, Some(step));
    let access = b.span_of(unit, "shapes.Circle", 0);
    let left = b.reference(unit, "shapes", 0, None);
    let right = b.reference(unit, "Circle", 0, None);
    b.node(unit, NodeKind::MemberAccess { left, right }, access);

    // A stray binding in another file is outside a local's reach.
    let other = b.script("/src/Other.as", "package {\nstep();\n}\n");
    b.reference(other, "step", 0, Some(step));
    b.build()
}

#[test]
fn qualified_names_fall_back_to_lookup() {
    let model = factory();
    let doc = SourceDocument::new("/src/Factory.as".into(), Dialect::Script, FACTORY);
    let options = AnalysisOptions::default();
    let cancel = CancellationToken::new();

    let ctx = Context::new(&model, &options, &cancel);
    let response = definition(&ctx, &doc, Position::new(2, 27)).unwrap();
    expect![[r#"/src/shapes/Circle.as 1:13-1:19"#]].assert_eq(&format_definition(&response));

    let compiler_only = Resolver::compiler_only();
    let ctx = Context::new(&model, &options, &cancel).with_resolver(&compiler_only);
    let response = definition(&ctx, &doc, Position::new(2, 27)).unwrap();
    expect![[r#"no definition"#]].assert_eq(&format_definition(&response));
}

#[test]
fn rename_local_function_stays_in_its_file() {
    let model = factory();
    let doc = SourceDocument::new("/src/Factory.as".into(), Dialect::Script, FACTORY);
    let options = AnalysisOptions::default();
    let cancel = CancellationToken::new();
    let ctx = Context::new(&model, &options, &cancel);
    let outcome = rename(&ctx, &doc, Position::new(6, 1), "advance").unwrap();
    expect![[r#"/src/Factory.as: 4:9-4:13, 6:0-6:4"#]].assert_eq(&format_rename(&outcome));
}

// ---------------------------------------------------------------------------
// Applying a rename
// ---------------------------------------------------------------------------

const WIDGET: &str = "package ui {
public class Widget {
public function Widget() {
}
}
}
";

const PANEL: &str = "package {
import ui.Widget;
public class Panel {
var w = new Widget();
}
}
";

/// `ui.<name>` declared in `decl_path` and used twice from `Panel.as`.
fn widgets(name: &str, decl_path: &str, decl: &str, panel: &str) -> ProjectModel {
    let mut b = SnapshotBuilder::new();
    let unit = b.script(decl_path, decl);
    let ui = b.package(unit, "ui");
    let class = b.class(unit, Some(ui), name);
    b.constructor(unit, class);

    let panel_unit = b.script("/src/Panel.as", panel);
    let root = b.package(panel_unit, "");
    b.class(panel_unit, Some(root), "Panel");
    b.reference(panel_unit, name, 0, Some(class));
    let span = b.span_of(panel_unit, &format!("new {name}()"), 0);
    b.node(panel_unit, NodeKind::Call { is_new: true }, span);
    b.reference(panel_unit, name, 1, Some(class));
    b.build()
}

fn apply_edits(text: &str, edits: &[TextEdit]) -> String {
    let line_index = LineIndex::new(text);
    let mut spans: Vec<(usize, usize, &str)> = edits
        .iter()
        .map(|edit| {
            let start = line_index.offset(edit.range.start).expect("edit start in text");
            let end = line_index.offset(edit.range.end).expect("edit end in text");
            (start, end, edit.new_text.as_str())
        })
        .collect();
    spans.sort_by_key(|&(start, ..)| std::cmp::Reverse(start));
    let mut text = text.to_string();
    for (start, end, new_text) in spans {
        text.replace_range(start..end, new_text);
    }
    text
}

#[test]
fn applied_rename_leaves_no_old_name() {
    let model = widgets("Widget", "/src/ui/Widget.as", WIDGET, PANEL);
    let options = AnalysisOptions::default();
    let cancel = CancellationToken::new();
    let ctx = Context::new(&model, &options, &cancel);
    let panel = SourceDocument::new("/src/Panel.as".into(), Dialect::Script, PANEL);
    let RenameOutcome::Edit(plan) = rename(&ctx, &panel, Position::new(1, 10), "Gadget").unwrap() else {
        panic!("expected an edit");
    };

    let mut decl = WIDGET.to_string();
    let mut renamed_panel = PANEL.to_string();
    for doc in &plan.documents {
        match doc.path.to_str() {
            Some("/src/ui/Widget.as") => decl = apply_edits(WIDGET, &doc.edits),
            Some("/src/Panel.as") => renamed_panel = apply_edits(PANEL, &doc.edits),
            other => panic!("unexpected document {other:?}"),
        }
    }
    assert!(!decl.contains("Widget"), "{decl}");
    assert!(!renamed_panel.contains("Widget"), "{renamed_panel}");
    let file = plan.file_rename.expect("principal class renames its file");
    assert_eq!(file.to, Path::new("/src/ui/Gadget.as"));

    let model = widgets("Gadget", "/src/ui/Gadget.as", &decl, &renamed_panel);
    let ctx = Context::new(&model, &options, &cancel);
    let panel = SourceDocument::new("/src/Panel.as".into(), Dialect::Script, renamed_panel.as_str());
    let response = definition(&ctx, &panel, Position::new(1, 10)).unwrap();
    expect![[r#"/src/ui/Gadget.as 1:13-1:19"#]].assert_eq(&format_definition(&response));
    let response = definition(&ctx, &panel, Position::new(3, 12)).unwrap();
    expect![[r#"/src/ui/Gadget.as 2:16-2:22"#]].assert_eq(&format_definition(&response));
}
