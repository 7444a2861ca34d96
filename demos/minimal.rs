use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use pick_engine::{
    ext::{Action, ActionContext, BoxError, Candidate, CollectParams, Host, HostEvent, ScreenSize, WindowId},
    item::Decoration,
    Picker, PickerOptions,
};
use tokio_util::sync::CancellationToken;

struct Print;

#[async_trait]
impl Action<()> for Print {
    async fn invoke(
        &self,
        _host: &dyn Host,
        context: ActionContext<'_, ()>,
        _signal: CancellationToken,
    ) -> Result<bool, BoxError> {
        if let Some(item) = context.item {
            println!("{}", item.value);
        }
        Ok(false)
    }
}

struct HeadlessHost;

#[async_trait]
impl Host for HeadlessHost {
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
        Ok((String::new(), 0))
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

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    use pick_engine::builtin::{PlainRenderer, SubstringMatcher, VecSource};

    let candidates = vec![
        Candidate::new("alpha", ()),
        Candidate::new("beta", ()),
        Candidate::new("gamma", ()),
    ];
    let source = Arc::new(VecSource::new(candidates));

    let mut actions: HashMap<String, Arc<dyn Action<()>>> = HashMap::new();
    actions.insert("print".into(), Arc::new(Print));

    let picker = Picker::new(
        source,
        vec![Arc::new(SubstringMatcher)],
        Vec::new(),
        vec![Arc::new(PlainRenderer)],
        Vec::new(),
        actions,
        "print",
        PickerOptions::default(),
    );

    let host = HeadlessHost;
    picker.run(&host, CollectParams::default()).await?;
    Ok(())
}
