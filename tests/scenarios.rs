//! End-to-end scenario tests (S1-S6), driving the full pipeline through [`Picker::run`] or the
//! session store directly, rather than a single processor in isolation.

use std::{
    sync::{Arc, Mutex as StdMutex},
    time::Duration,
};

use async_trait::async_trait;
use pick_engine::{
    builtin::{PlainRenderer, SubstringMatcher, VecSource},
    ext::{
        Action, ActionContext, BoxError, Candidate, CollectParams, Decoration, Host, HostEvent,
        ScreenSize, WindowId,
    },
    event::Event,
    item::PickerContext,
    session::{LoadQuery, Session, SessionStore},
    Picker, PickerOptions, PickerOrchestrator,
};
use tokio_util::sync::CancellationToken;

fn filtered_values(orchestrator: &PickerOrchestrator<()>) -> Vec<String> {
    orchestrator
        .context()
        .filtered_items
        .iter()
        .map(|item| item.value.to_string())
        .collect()
}

struct TestHost {
    cmdline: StdMutex<(String, usize)>,
}

impl TestHost {
    fn new(cmdline: &str) -> Self {
        Self {
            cmdline: StdMutex::new((cmdline.to_string(), cmdline.len())),
        }
    }

    fn set_cmdline(&self, value: &str) {
        *self.cmdline.lock().unwrap() = (value.to_string(), value.len());
    }
}

#[async_trait]
impl Host for TestHost {
    async fn open_window(&self) -> Result<(WindowId, ScreenSize), BoxError> {
        Ok((WindowId(0), ScreenSize { columns: 80, rows: 20 }))
    }
    async fn move_window(&self, _window: WindowId, _size: ScreenSize) -> Result<(), BoxError> {
        Ok(())
    }
    async fn close_window(&self, _window: WindowId) -> Result<(), BoxError> {
        Ok(())
    }
    async fn read_cmdline(&self) -> Result<(String, usize), BoxError> {
        Ok(self.cmdline.lock().unwrap().clone())
    }
    async fn write_buffer(&self, _window: WindowId, _lines: &[String]) -> Result<(), BoxError> {
        Ok(())
    }
    async fn set_decorations(
        &self,
        _window: WindowId,
        _decorations: &[Decoration],
    ) -> Result<(), BoxError> {
        Ok(())
    }
    async fn request_redraw(&self) -> Result<(), BoxError> {
        Ok(())
    }
    async fn emit_event(&self, _event: HostEvent) -> Result<(), BoxError> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Captured {
    query: String,
    filtered_values: Vec<String>,
    cursor_value: Option<String>,
}

struct Record(Arc<StdMutex<Option<Captured>>>);

#[async_trait]
impl Action<()> for Record {
    async fn invoke(
        &self,
        _host: &dyn Host,
        context: ActionContext<'_, ()>,
        _signal: CancellationToken,
    ) -> Result<bool, BoxError> {
        *self.0.lock().unwrap() = Some(Captured {
            query: context.query.to_string(),
            filtered_values: context
                .filtered_items
                .iter()
                .map(|item| item.value.to_string())
                .collect(),
            cursor_value: context.item.map(|item| item.value.to_string()),
        });
        Ok(false)
    }
}

fn build_picker(
    values: Vec<&str>,
    captured: Arc<StdMutex<Option<Captured>>>,
) -> Picker<()> {
    build_picker_with_options(values, captured, PickerOptions::default())
}

fn build_picker_with_options(
    values: Vec<&str>,
    captured: Arc<StdMutex<Option<Captured>>>,
    options: PickerOptions,
) -> Picker<()> {
    let candidates: Vec<Candidate<()>> = values.into_iter().map(|v| Candidate::new(v, ())).collect();
    let source = Arc::new(VecSource::new(candidates));

    let mut actions: std::collections::HashMap<String, Arc<dyn Action<()>>> =
        std::collections::HashMap::new();
    actions.insert("record".into(), Arc::new(Record(captured)));

    Picker::new(
        source,
        vec![Arc::new(SubstringMatcher)],
        Vec::new(),
        vec![Arc::new(PlainRenderer)],
        Vec::new(),
        actions,
        "record",
        options,
    )
}

/// S1. Basic match: source yields `["apple", "apricot", "banana"]`, query `"ap"` ⇒ matched values
/// `["apple", "apricot"]`, render window with height=10 shows both at cursor=0, line=1.
#[tokio::test]
async fn s1_basic_match() {
    let captured = Arc::new(StdMutex::new(None));
    let picker = build_picker(vec!["apple", "apricot", "banana"], Arc::clone(&captured));
    let host = TestHost::new("ap");

    let orchestrator = Arc::clone(picker.orchestrator());
    let run = tokio::spawn(async move { picker.run(&host, CollectParams::default()).await });

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(filtered_values(&orchestrator), vec!["apple", "apricot"]);

    orchestrator.events().dispatch(Event::ActionInvoke("record".into()));
    let result = run.await.unwrap().unwrap();
    assert!(!result);

    let captured = captured.lock().unwrap().clone().expect("action invoked");
    assert_eq!(captured.query, "ap");
    assert_eq!(captured.filtered_values, vec!["apple", "apricot"]);
}

/// S4. Query-restart cancels stale work: dispatching `"a"`, `"ab"`, `"abc"` in quick succession
/// settles on the matched list for `"abc"` only.
#[tokio::test]
async fn s4_query_restart_cancels_stale() {
    let captured = Arc::new(StdMutex::new(None));
    let picker = build_picker(
        vec!["abcdef", "abxxxx", "zzzzzz"],
        Arc::clone(&captured),
    );
    let host = Arc::new(TestHost::new("a"));
    let orchestrator = Arc::clone(picker.orchestrator());
    let run = {
        let host = Arc::clone(&host);
        tokio::spawn(async move { picker.run(host.as_ref(), CollectParams::default()).await })
    };

    tokio::time::sleep(Duration::from_millis(15)).await;
    host.set_cmdline("ab");
    tokio::time::sleep(Duration::from_millis(15)).await;
    host.set_cmdline("abc");
    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(filtered_values(&orchestrator), vec!["abcdef"]);

    orchestrator.events().dispatch(Event::ActionInvoke("record".into()));
    run.await.unwrap().unwrap();
    let captured = captured.lock().unwrap().clone().expect("action invoked");
    assert_eq!(captured.filtered_values, vec!["abcdef"]);
}

/// Regression: with a scrolled window (`offset > 0`, so the window holds fewer rows than the full
/// matched list), selecting "the item under the cursor" and invoking an action must both act on
/// the item at the absolute cursor position in the full matched-and-sorted list, not on a
/// same-indexed slot in the (shorter) visible window.
#[tokio::test]
async fn cursor_actions_use_the_full_list_once_the_window_has_scrolled() {
    use pick_engine::{belt::IndexArg, event::SelectMethod, processor::render::RenderOptions};

    let captured = Arc::new(StdMutex::new(None));
    let options = PickerOptions {
        render: RenderOptions {
            height: 2,
            scroll_offset: 0,
        },
        ..PickerOptions::default()
    };
    let picker = build_picker_with_options(
        vec!["a0", "a1", "a2", "a3", "a4"],
        Arc::clone(&captured),
        options,
    );
    let host = TestHost::new("a");

    let orchestrator = Arc::clone(picker.orchestrator());
    let run = tokio::spawn(async move { picker.run(&host, CollectParams::default()).await });

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(filtered_values(&orchestrator), vec!["a0", "a1", "a2", "a3", "a4"]);

    // Cursor index 3 is the full list's 4th item, but with height=2 the visible window only ever
    // holds 2 rows: a same-indexed lookup into the window would be out of range or wrong.
    orchestrator.events().dispatch(Event::MoveCursorAt(IndexArg::Absolute(3)));
    tokio::time::sleep(Duration::from_millis(20)).await;

    orchestrator.events().dispatch(Event::SelectItem {
        target: None,
        method: SelectMethod::On,
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(orchestrator.selection().contains(&3));

    orchestrator.events().dispatch(Event::ActionInvoke("record".into()));
    run.await.unwrap().unwrap();
    let captured = captured.lock().unwrap().clone().expect("action invoked");
    assert_eq!(captured.cursor_value.as_deref(), Some("a3"));
    assert_eq!(captured.filtered_values, vec!["a0", "a1", "a2", "a3", "a4"]);
}

/// S5. Session ring eviction: saving 105 sessions keeps only the most recent 100.
#[test]
fn s5_session_ring_eviction() {
    let store: SessionStore<()> = SessionStore::new();
    for i in 0..105 {
        store
            .save(Session {
                name: format!("s{i}"),
                args: Vec::new(),
                context: PickerContext::default(),
            })
            .unwrap();
    }
    let list = store.list();
    assert_eq!(list.len(), 100);
    assert_eq!(list[0].name, "s104");
    assert_eq!(list[list.len() - 1].name, "s5");
}

/// S6. Resume by filter: after saving `[file, buf, file, buf, file]`, `load({name: "file", number:
/// 2})` returns the `file` session saved just before the most recent one.
#[test]
fn s6_resume_by_filter() {
    let store: SessionStore<()> = SessionStore::new();
    for (index, name) in ["file", "buf", "file", "buf", "file"].into_iter().enumerate() {
        let mut context = PickerContext::default();
        context.query = format!("save-{index}");
        store
            .save(Session {
                name: name.into(),
                args: Vec::new(),
                context,
            })
            .unwrap();
    }

    let loaded = store
        .load(LoadQuery {
            name: Some("file".into()),
            number: Some(2),
        })
        .expect("a second-most-recent \"file\" session exists");
    assert_eq!(loaded.context.query, "save-2");
}
