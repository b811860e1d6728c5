//! End-to-end contract: load, navigate, observe visibility, render.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use pdf_reader::{Reader, ReaderOptions, ThumbnailRail};
use pdf_reader_engine::{LopdfEngine, OpenSource};
use pdf_reader_render::HIDDEN_RASTER_SCALE;
use pdf_reader_viewport::{
    ContentRegion, PageRegion, Point, Rect, ScrollBehavior, ScrollRegion, SizedRegion,
};

const PAGE_WIDTH: f32 = 400.0;
const PAGE_HEIGHT: f32 = 500.0;

fn three_page_pdf() -> Vec<u8> {
    use lopdf::{dictionary, Document, Object, ObjectId};

    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::new();
    for _ in 0..3 {
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 400.into(), 500.into()],
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => 3_i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("failed to save test PDF");
    bytes
}

/// Layout model standing in for the host: a 400x500 viewport over three
/// vertically stacked pages that move with the scroll offset.
struct HostLayout {
    scroll: Cell<Point>,
    scale: Cell<f32>,
    wrapper_size: Cell<(f32, f32)>,
}

impl HostLayout {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            scroll: Cell::new(Point::ZERO),
            scale: Cell::new(1.0),
            wrapper_size: Cell::new((0.0, 0.0)),
        })
    }

    fn container_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT)
    }
}

struct Container(Rc<HostLayout>);

impl ScrollRegion for Container {
    fn bounding_rect(&self) -> Rect {
        self.0.container_rect()
    }

    fn scroll_offset(&self) -> Point {
        self.0.scroll.get()
    }

    fn set_scroll_offset(&self, offset: Point) {
        self.0.scroll.set(offset);
    }

    fn scroll_to(&self, offset: Point, _behavior: ScrollBehavior) {
        self.0.scroll.set(offset);
    }
}

struct Wrapper(Rc<HostLayout>);

impl SizedRegion for Wrapper {
    fn set_size(&self, width: f32, height: f32) {
        self.0.wrapper_size.set((width, height));
    }
}

struct Content(Rc<HostLayout>);

impl ContentRegion for Content {
    fn bounding_rect(&self) -> Rect {
        let scroll = self.0.scroll.get();
        let scale = self.0.scale.get();
        Rect::new(
            -scroll.x,
            -scroll.y,
            PAGE_WIDTH * scale,
            3.0 * PAGE_HEIGHT * scale,
        )
    }

    fn set_scale(&self, scale: f32) {
        self.0.scale.set(scale);
    }
}

struct PageBox {
    layout: Rc<HostLayout>,
    page_number: u32,
}

impl PageRegion for PageBox {
    fn bounding_rect(&self) -> Rect {
        let scroll = self.layout.scroll.get();
        let scale = self.layout.scale.get();
        let top = (self.page_number - 1) as f32 * PAGE_HEIGHT * scale;
        Rect::new(
            -scroll.x,
            top - scroll.y,
            PAGE_WIDTH * scale,
            PAGE_HEIGHT * scale,
        )
    }
}

fn mounted_reader(options: ReaderOptions) -> (Reader<LopdfEngine>, Rc<HostLayout>) {
    let mut reader = Reader::open(
        LopdfEngine::new(),
        OpenSource::Bytes(three_page_pdf()),
        options,
    );
    assert!(reader.is_ready());
    assert_eq!(reader.page_count(), 3);

    let layout = HostLayout::new();
    reader.attach_viewport(
        Rc::new(Container(layout.clone())),
        Rc::new(Wrapper(layout.clone())),
        Rc::new(Content(layout.clone())),
    );

    for page_number in 1..=3 {
        reader.mount_page(
            page_number,
            Rc::new(PageBox {
                layout: layout.clone(),
                page_number,
            }),
        );
    }

    (reader, layout)
}

#[test]
fn go_to_page_then_visibility_yields_current_page() {
    let (mut reader, layout) = mounted_reader(ReaderOptions::default());

    let t0 = Instant::now();
    reader.pump(t0);
    assert_eq!(reader.current_page(), 1);

    assert!(reader.go_to_page(3, ScrollBehavior::Smooth));
    assert_eq!(layout.scroll.get().y, 2.0 * PAGE_HEIGHT);

    reader.pump(t0 + Duration::from_millis(16));
    assert_eq!(reader.current_page(), 3);
}

#[test]
fn initial_page_is_clamped_and_ready_fires() {
    let ready_count = Rc::new(Cell::new(0u32));
    let counter = ready_count.clone();

    let (mut reader, layout) =
        mounted_reader(ReaderOptions::default().with_initial_page(99));
    reader.set_ready_callback(Box::new(move || {
        counter.set(counter.get() + 1);
    }));

    let t0 = Instant::now();
    reader.pump(t0);

    // Clamped to the last page, navigated instantly.
    assert_eq!(layout.scroll.get().y, 2.0 * PAGE_HEIGHT);
    assert_eq!(reader.current_page(), 3);
    assert_eq!(ready_count.get(), 1);

    // Ready fires exactly once.
    reader.pump(t0 + Duration::from_millis(16));
    assert_eq!(ready_count.get(), 1);
}

#[test]
fn pages_render_low_res_first_then_full_res_once_visible() {
    let (mut reader, _layout) = mounted_reader(ReaderOptions::default());

    let t0 = Instant::now();
    let mut low_res = Vec::new();
    for tick in 0..50 {
        let report = reader.pump(t0 + Duration::from_millis(tick));
        assert!(report.failures.is_empty());
        low_res.extend(report.frames);
        if low_res.len() >= 3 {
            break;
        }
    }

    // Every page gets a placeholder raster at the hidden fallback scale.
    assert_eq!(low_res.len(), 3);
    assert!(low_res.iter().all(|frame| frame.scale == HIDDEN_RASTER_SCALE));

    // Page 1 was reported visible on the first sweep; once the debounce
    // settles it re-renders at device resolution.
    let mut full_res = Vec::new();
    for tick in 0..50 {
        let now = t0 + Duration::from_millis(150 + tick);
        full_res.extend(reader.pump(now).frames);
        if !full_res.is_empty() {
            break;
        }
    }

    assert_eq!(full_res.len(), 1);
    let frame = full_res[0];
    assert_eq!(frame.page_number, 1);
    assert_eq!(frame.scale, 1.0);
    assert_eq!((frame.width, frame.height), (400, 500));

    let (scale, surface) = reader.page_bitmap(1).expect("bitmap kept");
    assert_eq!(scale, 1.0);
    assert!(surface.is_painted());
}

#[test]
fn fit_zooms_derive_from_viewport_and_page() {
    let (mut reader, _layout) = mounted_reader(ReaderOptions::default());
    reader.pump(Instant::now());

    // Viewport and page are both 400x500, so both fits resolve to 1.0.
    assert_eq!(reader.zoom_to_fit_width(), Some(1.0));
    assert_eq!(reader.zoom_to_fit_page(), Some(1.0));
}

#[test]
fn unready_document_stays_inert() {
    let mut reader = Reader::open(
        LopdfEngine::new(),
        OpenSource::Bytes(b"garbage".to_vec()),
        ReaderOptions::default(),
    );

    assert!(!reader.is_ready());
    assert_eq!(reader.page_count(), 0);
    assert!(!reader.go_to_page(1, ScrollBehavior::Instant));

    let report = reader.pump(Instant::now());
    assert!(report.frames.is_empty());
    assert!(report.failures.is_empty());
}

#[test]
fn thumbnail_rail_navigates_after_mount() {
    let (mut reader, layout) = mounted_reader(ReaderOptions::default());
    let doc = reader.document().expect("ready document");

    let mut rail = ThumbnailRail::new(
        doc,
        reader.page_count(),
        reader.viewport().clone(),
        reader.render_config().clone(),
    );

    let t0 = Instant::now();
    reader.pump(t0);

    let mut rendered = 0;
    for _ in 0..100 {
        rendered += rail.pump(reader.engine(), t0).len();
        if rendered == 3 {
            break;
        }
    }
    assert_eq!(rendered, 3);
    assert!(rail.is_ready(2, t0));

    assert!(rail.activate(2));
    assert_eq!(layout.scroll.get().y, PAGE_HEIGHT);

    reader.pump(t0 + Duration::from_millis(16));
    assert_eq!(reader.current_page(), 2);
}
