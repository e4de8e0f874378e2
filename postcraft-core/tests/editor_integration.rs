//! Editor Integration Tests
//!
//! Exercises a full editing session:
//! - Adding, duplicating and removing elements
//! - Selection following edits
//! - Pointer drag and resize through the canvas interaction
//! - Brand kit import and layout reuse
//! - Posts built from assistant suggestions

use async_trait::async_trait;
use postcraft_core::assist::{build_posts, extract_palette, regenerate_background};
use postcraft_core::brandkit::MemoryBrandKitRepository;
use postcraft_core::{
    BackgroundElement, BrandKitLibrary, CanvasInteraction, DesignAssistant, EditorError,
    EditorResult, EditorSession, Element, ElementId, ElementPatch, Frame, GeneratedImage,
    LayerDirection, LayoutRequest, NewElement, PointerEvent, PointerTarget, Post, PostId,
    PostSize, ShapeKind, TextSuggestion,
};

/// Session with one post on a square canvas.
fn session() -> (EditorSession, PostId) {
    let mut session = EditorSession::new(PostSize::SQUARE);
    let post_id = session.create_post();
    (session, post_id)
}

fn post<'a>(session: &'a EditorSession, post_id: &PostId) -> &'a Post {
    session.post(post_id).expect("post exists")
}

fn frame(session: &EditorSession, post_id: &PostId, id: &ElementId) -> Frame {
    post(session, post_id)
        .get(id)
        .and_then(Element::frame)
        .cloned()
        .expect("frame")
}

fn ids(post: &Post) -> Vec<ElementId> {
    post.elements().iter().map(|e| e.id().clone()).collect()
}

// ==========================================================================
// Element lifecycle
// ==========================================================================

#[test]
fn test_new_text_is_centered_and_selected() {
    let (mut session, post_id) = session();
    let id = session
        .add_element(&post_id, NewElement::Text(None))
        .expect("added");

    let frame = frame(&session, &post_id, &id);
    assert!((frame.x - 390.0).abs() < f32::EPSILON);
    assert!((frame.y - 515.0).abs() < f32::EPSILON);
    assert!((frame.width - 300.0).abs() < f32::EPSILON);
    assert!((frame.height - 50.0).abs() < f32::EPSILON);
    assert_eq!(session.selection(), Some(&id));

    // New elements sit directly above the background, which stays last.
    let post = post(&session, &post_id);
    assert_eq!(post.elements()[0].id(), &id);
    assert!(matches!(post.elements().last(), Some(Element::Background(_))));
}

#[test]
fn test_duplicate_is_offset_adjacent_and_selected() {
    let (mut session, post_id) = session();
    let below = session
        .add_element(&post_id, NewElement::Shape(ShapeKind::Circle))
        .expect("added");
    let source = session
        .add_element(&post_id, NewElement::Text(None))
        .expect("added");
    session
        .update_element(&post_id, &source, &ElementPatch::position(100.0, 100.0))
        .expect("moved");

    let copy = session
        .duplicate_element(&post_id, &source)
        .expect("duplicated");

    assert_ne!(copy, source);
    let copied = frame(&session, &post_id, &copy);
    assert!((copied.x - 120.0).abs() < f32::EPSILON);
    assert!((copied.y - 120.0).abs() < f32::EPSILON);
    assert_eq!(session.selection(), Some(&copy));

    // Elements are added directly above the background, so the earlier
    // shape is on top; the copy lands immediately above its source.
    let order = ids(post(&session, &post_id));
    assert_eq!(order[..3], [below, copy, source]);
}

#[test]
fn test_removing_selected_element_clears_selection() {
    let (mut session, post_id) = session();
    let id = session
        .add_element(&post_id, NewElement::Gradient)
        .expect("added");
    assert_eq!(session.selection(), Some(&id));

    session.remove_element(&post_id, &id);
    assert_eq!(session.selection(), None);
    assert!(post(&session, &post_id).get(&id).is_none());
}

#[test]
fn test_background_cannot_be_removed_or_moved() {
    let (mut session, post_id) = session();
    let shape = session
        .add_element(&post_id, NewElement::Shape(ShapeKind::Rectangle))
        .expect("added");
    let background = post(&session, &post_id).background().id.clone();
    let before = post(&session, &post_id).clone();

    session.remove_element(&post_id, &background);
    session.move_element(&post_id, &background, LayerDirection::Up);
    session.move_element(&post_id, &shape, LayerDirection::Down);
    session.reorder_elements(&post_id, &background, &shape);

    assert!(post(&session, &post_id).same_revision(&before));
}

#[test]
fn test_unknown_ids_are_no_ops() {
    let (mut session, post_id) = session();
    let before = post(&session, &post_id).clone();
    let ghost = ElementId::new();

    session.remove_element(&post_id, &ghost);
    session.toggle_lock(&post_id, &ghost);
    session.toggle_visibility(&post_id, &ghost);
    assert!(session.duplicate_element(&post_id, &ghost).is_none());

    assert!(post(&session, &post_id).same_revision(&before));
}

#[test]
fn test_empty_rename_is_rejected() {
    let (mut session, post_id) = session();
    let id = session
        .add_element(&post_id, NewElement::Text(None))
        .expect("added");
    let err = session
        .rename_element(&post_id, &id, "   ")
        .expect_err("empty name");
    assert!(matches!(err, EditorError::Validation(_)));

    session
        .rename_element(&post_id, &id, "Headline")
        .expect("renamed");
    assert_eq!(
        frame(&session, &post_id, &id).name.as_deref(),
        Some("Headline")
    );
}

// ==========================================================================
// Pointer interaction
// ==========================================================================

#[test]
fn test_drag_commits_rounded_position() {
    let (mut session, post_id) = session();
    let id = session
        .add_element(&post_id, NewElement::Text(None))
        .expect("added");
    let mut canvas = CanvasInteraction::new();

    canvas
        .handle(
            &mut session,
            &post_id,
            &PointerEvent::down(PointerTarget::Element(id.clone()), 400.0, 520.0),
        )
        .expect("down");
    canvas
        .handle(&mut session, &post_id, &PointerEvent::moved(450.4, 530.6))
        .expect("move");
    canvas
        .handle(&mut session, &post_id, &PointerEvent::up(450.4, 530.6))
        .expect("up");

    let frame = frame(&session, &post_id, &id);
    assert!((frame.x - 440.0).abs() < f32::EPSILON);
    assert!((frame.y - 526.0).abs() < f32::EPSILON);
    assert!(!canvas.is_active());
}

#[test]
fn test_resize_never_goes_below_floor() {
    let (mut session, post_id) = session();
    let id = session
        .add_element(&post_id, NewElement::Shape(ShapeKind::Rectangle))
        .expect("added");
    let mut canvas = CanvasInteraction::new();

    canvas
        .handle(
            &mut session,
            &post_id,
            &PointerEvent::down(PointerTarget::ResizeHandle(id.clone()), 0.0, 0.0),
        )
        .expect("down");
    assert!(canvas.is_resizing());
    canvas
        .handle(&mut session, &post_id, &PointerEvent::moved(-1000.0, -1000.0))
        .expect("move");

    let frame = frame(&session, &post_id, &id);
    assert!((frame.width - 20.0).abs() < f32::EPSILON);
    assert!((frame.height - 20.0).abs() < f32::EPSILON);
}

#[test]
fn test_locked_element_selects_but_does_not_move() {
    let (mut session, post_id) = session();
    let id = session
        .add_element(&post_id, NewElement::Text(None))
        .expect("added");
    session.toggle_lock(&post_id, &id);
    let before = frame(&session, &post_id, &id);
    session.deselect();

    let mut canvas = CanvasInteraction::new();
    canvas
        .handle(
            &mut session,
            &post_id,
            &PointerEvent::down(PointerTarget::Element(id.clone()), 400.0, 520.0),
        )
        .expect("down");
    canvas
        .handle(&mut session, &post_id, &PointerEvent::moved(600.0, 700.0))
        .expect("move");

    assert_eq!(session.selection(), Some(&id));
    let after = frame(&session, &post_id, &id);
    assert!((after.x - before.x).abs() < f32::EPSILON);
    assert!((after.y - before.y).abs() < f32::EPSILON);
}

#[test]
fn test_canvas_click_deselects() {
    let (mut session, post_id) = session();
    session
        .add_element(&post_id, NewElement::Text(None))
        .expect("added");
    let mut canvas = CanvasInteraction::new();
    canvas
        .handle(
            &mut session,
            &post_id,
            &PointerEvent::down(PointerTarget::Canvas, 5.0, 5.0),
        )
        .expect("down");
    assert_eq!(session.selection(), None);
}

// ==========================================================================
// Brand kits
// ==========================================================================

#[test]
fn test_kit_without_layouts_is_rejected() {
    let mut library =
        BrandKitLibrary::load(Box::new(MemoryBrandKitRepository::new())).expect("library");

    let err = library
        .import_file(r#"{"name":"X"}"#)
        .expect_err("missing layouts");
    assert!(matches!(err, EditorError::InvalidFormat(_)));
    assert!(library.kits().is_empty());
}

#[test]
fn test_layout_round_trips_through_kit_file() {
    let (mut session, post_id) = session();
    session
        .add_element(&post_id, NewElement::Text(Some("Sale".into())))
        .expect("added");
    session
        .add_element(&post_id, NewElement::Shape(ShapeKind::Circle))
        .expect("added");

    let mut kit = postcraft_core::BrandKit::new("Acme");
    let template = kit
        .add_layout_from_post("Promo", post(&session, &post_id))
        .clone();
    let json = kit.to_json().expect("json");

    let mut library =
        BrandKitLibrary::load(Box::new(MemoryBrandKitRepository::new())).expect("library");
    let imported = library.import_file(&json).expect("import").clone();
    assert_eq!(imported.layouts.len(), 1);

    let target = session.create_post();
    session.apply_layout(&target, &imported.layouts[0]);
    let applied = post(&session, &target);
    let template_foreground = template
        .elements
        .iter()
        .filter(|e| !e.is_background())
        .count();
    assert_eq!(applied.foreground().len(), template_foreground);

    // Fresh ids every time a layout is applied.
    let source_ids = ids(post(&session, &post_id));
    assert!(applied
        .foreground()
        .iter()
        .all(|e| !source_ids.contains(e.id())));
}

// ==========================================================================
// Assistant
// ==========================================================================

/// Answers with the topic as a headline; topics containing "fail" error.
struct ScriptedAssistant;

#[async_trait]
impl DesignAssistant for ScriptedAssistant {
    async fn suggest_layout(&self, request: &LayoutRequest) -> EditorResult<Vec<TextSuggestion>> {
        if request.topic.contains("fail") {
            return Err(EditorError::Generation(format!("no layout for {}", request.topic)));
        }
        Ok(vec![TextSuggestion {
            text: request.topic.clone(),
            x: 10.0,
            y: 50.0,
            width: 80.0,
            height: 10.0,
            font_family: None,
            font_size: None,
            color: None,
            text_align: None,
        }])
    }

    async fn generate_image(
        &self,
        _prompt: &str,
        _provider: Option<&str>,
    ) -> EditorResult<GeneratedImage> {
        Ok(GeneratedImage {
            mime: "image/png".into(),
            bytes: vec![1, 2, 3],
        })
    }

    async fn extract_palette(&self, _image_src: &str) -> EditorResult<Vec<String>> {
        Ok(vec!["#112233".into(), "#ffffff".into()])
    }
}

fn request(topic: &str) -> LayoutRequest {
    LayoutRequest {
        image_src: format!("data:image/png;base64,{topic}"),
        topic: topic.into(),
        content_level: Default::default(),
    }
}

fn headline(post: &Post) -> String {
    match &post.elements()[0] {
        Element::Text(text) => text.content.clone(),
        other => panic!("expected text, got {other:?}"),
    }
}

#[tokio::test]
async fn test_suggestions_become_ordered_carousel() {
    let requests = [request("one"), request("fail"), request("three")];
    let generated = build_posts(&ScriptedAssistant, &requests, PostSize::SQUARE)
        .await
        .expect("partial success");

    assert_eq!(generated.posts.len(), 2);
    assert_eq!(headline(&generated.posts[0]), "one");
    assert_eq!(headline(&generated.posts[1]), "three");
    assert_eq!(generated.failures.len(), 1);
    assert_eq!(generated.failures[0].index, 1);

    let carousel = generated.posts[0].carousel_id.clone().expect("carousel");
    assert_eq!(generated.posts[1].carousel_id.as_ref(), Some(&carousel));
    assert_eq!(generated.posts[1].slide_index, Some(1));

    // Percent geometry converted to post pixels.
    let frame = generated.posts[0].elements()[0].frame().cloned().expect("frame");
    assert!((frame.x - 108.0).abs() < 1e-3);
    assert!((frame.y - 540.0).abs() < 1e-3);
}

#[tokio::test]
async fn test_all_failed_suggestions_is_an_error() {
    let err = build_posts(&ScriptedAssistant, &[request("fail")], PostSize::SQUARE)
        .await
        .expect_err("nothing built");
    assert!(matches!(err, EditorError::Generation(_)));

    let err = build_posts(&ScriptedAssistant, &[], PostSize::SQUARE)
        .await
        .expect_err("no images");
    assert!(matches!(err, EditorError::Validation(_)));
}

#[tokio::test]
async fn test_background_regeneration_and_palette() {
    let post = Post::with_background(BackgroundElement {
        prompt: Some("sunset over dunes".into()),
        ..BackgroundElement::placeholder()
    });

    let regenerated = regenerate_background(&ScriptedAssistant, &post)
        .await
        .expect("regenerated");
    assert_eq!(regenerated.background().src, "data:image/png;base64,AQID");
    assert_eq!(regenerated.background().id, post.background().id);

    let with_palette = extract_palette(&ScriptedAssistant, &regenerated)
        .await
        .expect("palette");
    assert_eq!(
        with_palette.palette.as_deref(),
        Some(&["#112233".to_string(), "#ffffff".to_string()][..])
    );
    assert!(!with_palette.same_revision(&regenerated));

    let bare = Post::new();
    let err = regenerate_background(&ScriptedAssistant, &bare)
        .await
        .expect_err("no prompt");
    assert!(matches!(err, EditorError::Validation(_)));
}
