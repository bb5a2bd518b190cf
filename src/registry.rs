use crate::capability::FullscreenSupport;
use crate::config::{configure, Configuration, Mode, Overrides};
use crate::delivery::{poll_responses, Adapter, Fetcher, ResponseStream};
use crate::dom::{Document, ElementId};
use crate::error::{ConfigError, ConsoleError, DeliveryError};
use crate::models::WidgetStatus;
use crate::render::render;
use futures_util::StreamExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockMappedWriteGuard, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Identifies one attached widget. Stale after the widget is detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetHandle {
    id: Uuid,
    root: ElementId,
}

impl WidgetHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn root(&self) -> ElementId {
        self.root
    }
}

struct WidgetState {
    id: Uuid,
    config: Configuration,
    view: ElementId,
    control: Option<ElementId>,
    adapter: Adapter,
    last_error: Option<String>,
}

#[derive(Default)]
struct Inner {
    document: Document,
    widgets: HashMap<ElementId, WidgetState>,
}

impl Inner {
    /// Renders `payload` into the widget on `root` and scrolls to it.
    ///
    /// Returns false when there is no widget to render into, or when it is not
    /// the widget `expected` names.
    fn append_payload(&mut self, root: ElementId, expected: Option<Uuid>, payload: &Value) -> bool {
        let Some(widget) = self.widgets.get(&root) else {
            return false;
        };
        if expected.is_some_and(|id| id != widget.id) {
            return false;
        }

        let line = render(&widget.config, payload);
        let view = widget.view;
        if !self.document.append_html(view, line) {
            return false;
        }
        let height = self.document.scroll_height(view);
        self.document.scroll_to(view, height);
        true
    }

    /// Drops the widget on `root` once `root` has left the document.
    fn prune(&mut self, root: ElementId) -> bool {
        if self.document.contains(root) {
            return false;
        }
        let Some(widget) = self.widgets.remove(&root) else {
            return false;
        };
        widget.adapter.abort();
        info!(widget = %widget.id, "Console root removed from the page, widget dropped");
        true
    }

    fn widget_mut(&mut self, handle: WidgetHandle) -> Result<&mut WidgetState, ConsoleError> {
        self.widgets
            .get_mut(&handle.root)
            .filter(|widget| widget.id == handle.id)
            .ok_or(ConsoleError::UnknownWidget)
    }

    fn control_root(&self, element: ElementId) -> Option<ElementId> {
        let mut current = Some(element);
        while let Some(id) = current {
            let owner = self
                .widgets
                .iter()
                .find(|(_, widget)| widget.control == Some(id))
                .map(|(root, _)| *root);
            if owner.is_some() {
                return owner;
            }
            current = self.document.get(id).and_then(|e| e.parent);
        }
        None
    }
}

/// Owns the page model and every console widget attached to it.
#[derive(Clone)]
pub struct ConsoleRegistry {
    inner: Arc<RwLock<Inner>>,
    fetcher: Arc<dyn Fetcher>,
    fullscreen: Arc<dyn FullscreenSupport>,
}

impl ConsoleRegistry {
    pub fn new(fetcher: Arc<dyn Fetcher>, fullscreen: Arc<dyn FullscreenSupport>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            fetcher,
            fullscreen,
        }
    }

    pub async fn document(&self) -> RwLockReadGuard<'_, Document> {
        RwLockReadGuard::map(self.inner.read().await, |inner| &inner.document)
    }

    pub async fn document_mut(&self) -> RwLockMappedWriteGuard<'_, Document> {
        RwLockWriteGuard::map(self.inner.write().await, |inner| &mut inner.document)
    }

    pub async fn create_element(&self, tag: &str) -> ElementId {
        self.inner.write().await.document.create_element(tag, &[])
    }

    /// Attaches a console widget to `root`.
    ///
    /// Attaching to an element that already carries a widget merges
    /// `overrides` into its configuration and returns the existing handle.
    /// The delivery adapter is only ever chosen on the first attach.
    pub async fn attach(
        &self,
        root: ElementId,
        overrides: Overrides,
    ) -> Result<WidgetHandle, ConsoleError> {
        let mut inner = self.inner.write().await;

        inner.prune(root);
        if !inner.document.contains(root) {
            return Err(ConsoleError::UnknownElement);
        }

        if let Some(widget) = inner.widgets.get_mut(&root) {
            let handle = WidgetHandle {
                id: widget.id,
                root,
            };
            reconfigure(widget, overrides)?;
            return Ok(handle);
        }

        let config = configure(None, overrides);
        config.validate()?;

        let id = Uuid::new_v4();
        let adapter = self.start_adapter(root, id, &config)?;

        let document = &mut inner.document;
        document.add_class(root, "console");
        let view = document
            .append_element(root, "div", &["console-view"])
            .ok_or(ConsoleError::UnknownElement)?;

        let control = if self.fullscreen.is_supported() {
            let control = document.prepend_element(root, "div", &["fullscreen"]);
            if let Some(control) = control {
                document.append_element(control, "span", &["glyphicon", "glyphicon-fullscreen"]);
            }
            control
        } else {
            debug!("Fullscreen unsupported, skipping control");
            None
        };

        info!(widget = %id, mode = config.mode.as_str(), "Console widget attached");

        inner.widgets.insert(
            root,
            WidgetState {
                id,
                config,
                view,
                control,
                adapter,
                last_error: None,
            },
        );

        Ok(WidgetHandle { id, root })
    }

    fn start_adapter(
        &self,
        root: ElementId,
        id: Uuid,
        config: &Configuration,
    ) -> Result<Adapter, ConsoleError> {
        let adapter = match config.mode {
            Mode::Event => Adapter::Event {
                event_name: config.event_name.clone(),
            },
            Mode::Polling => {
                let request = config
                    .endpoint
                    .as_ref()
                    .ok_or(ConfigError::MissingEndpoint)?
                    .request();
                self.fetcher.check(&request)?;
                info!(widget = %id, url = %request.url, interval_ms = config.poll_interval_ms, "Starting poll loop");
                let responses =
                    poll_responses(self.fetcher.clone(), request, config.poll_interval());
                let task = tokio::spawn(drive_polling(self.inner.clone(), root, id, responses));
                Adapter::Polling { task }
            }
            Mode::Socket => {
                warn!(widget = %id, "Socket delivery is not implemented, no messages will arrive");
                Adapter::Socket
            }
        };
        Ok(adapter)
    }

    /// Merges `overrides` into an attached widget's configuration.
    pub async fn configure(
        &self,
        handle: WidgetHandle,
        overrides: Overrides,
    ) -> Result<(), ConsoleError> {
        let mut inner = self.inner.write().await;
        let widget = inner.widget_mut(handle)?;
        reconfigure(widget, overrides)
    }

    /// Delivers `payload` as `event` on `root`. Returns whether a widget took it.
    pub async fn dispatch(&self, root: ElementId, event: &str, payload: impl Into<Value>) -> bool {
        let payload = payload.into();
        let mut inner = self.inner.write().await;
        let listening = inner
            .widgets
            .get(&root)
            .is_some_and(|widget| widget.adapter.listens_for(event));
        if !listening {
            debug!(event, "No console widget listening");
            return false;
        }
        if inner.append_payload(root, None, &payload) {
            return true;
        }
        inner.prune(root);
        false
    }

    /// Clicks `element`. A click on a fullscreen control, or inside one,
    /// toggles fullscreen for the control's widget.
    pub async fn click(&self, element: ElementId) -> bool {
        let mut inner = self.inner.write().await;
        let Some(root) = inner.control_root(element) else {
            return false;
        };
        if inner.document.fullscreen_element() == Some(root) {
            inner.document.exit_fullscreen();
            debug!("Left fullscreen");
        } else {
            inner.document.request_fullscreen(root);
            debug!("Entered fullscreen");
        }
        true
    }

    pub async fn handle(&self, root: ElementId) -> Option<WidgetHandle> {
        let inner = self.inner.read().await;
        if !inner.document.contains(root) {
            return None;
        }
        inner
            .widgets
            .get(&root)
            .map(|widget| WidgetHandle { id: widget.id, root })
    }

    pub async fn status(&self, root: ElementId) -> Option<WidgetStatus> {
        let inner = self.inner.read().await;
        if !inner.document.contains(root) {
            return None;
        }
        let widget = inner.widgets.get(&root)?;
        Some(WidgetStatus {
            widget_id: widget.id,
            mode: widget.config.mode,
            line_count: inner.document.html_children(widget.view).len(),
            polling: widget.adapter.is_polling(),
            fullscreen: inner.document.fullscreen_element() == Some(root),
            last_error: widget.last_error.clone(),
        })
    }

    /// Stops delivery and removes the widget's scaffold from `root`.
    ///
    /// Pending poll responses are discarded. If polling had already stopped on
    /// a failed request, that failure is returned.
    pub async fn detach(&self, handle: WidgetHandle) -> Result<(), ConsoleError> {
        let widget = {
            let mut inner = self.inner.write().await;
            inner.widget_mut(handle)?;
            let Some(widget) = inner.widgets.remove(&handle.root) else {
                return Err(ConsoleError::UnknownWidget);
            };
            let document = &mut inner.document;
            document.remove(widget.view);
            if let Some(control) = widget.control {
                document.remove(control);
            }
            if document.fullscreen_element() == Some(handle.root) {
                document.exit_fullscreen();
            }
            document.remove_class(handle.root, "console");
            widget
        };

        info!(widget = %widget.id, "Console widget detached");
        widget.adapter.stop().await?;
        Ok(())
    }
}

fn reconfigure(widget: &mut WidgetState, overrides: Overrides) -> Result<(), ConsoleError> {
    let config = configure(Some(&widget.config), overrides);
    config.validate()?;
    if config.mode != widget.config.mode {
        debug!(
            widget = %widget.id,
            from = widget.config.mode.as_str(),
            to = config.mode.as_str(),
            "Mode change does not restart delivery"
        );
    }
    widget.config = config;
    Ok(())
}

async fn drive_polling(
    inner: Arc<RwLock<Inner>>,
    root: ElementId,
    widget_id: Uuid,
    mut responses: ResponseStream,
) -> Result<(), DeliveryError> {
    while let Some(response) = responses.next().await {
        match response {
            Ok(body) => {
                let mut inner = inner.write().await;
                if !inner.append_payload(root, Some(widget_id), &Value::String(body)) {
                    debug!(widget = %widget_id, "Widget gone, dropping poll response");
                    if inner.widgets.get(&root).is_some_and(|w| w.id == widget_id) {
                        inner.prune(root);
                    }
                    return Ok(());
                }
            }
            Err(e) => {
                error!(widget = %widget_id, error = %e, "Poll request failed, stopping delivery");
                let mut inner = inner.write().await;
                if let Some(widget) = inner.widgets.get_mut(&root).filter(|w| w.id == widget_id) {
                    widget.last_error = Some(e.to_string());
                }
                return Err(e);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::StaticFullscreen;
    use crate::config::RequestOptions;
    use crate::delivery::HttpFetcher;
    use crate::render::HighlightRule;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct ScriptedFetcher {
        requests: Mutex<Vec<RequestOptions>>,
        responses: Mutex<VecDeque<Result<String, DeliveryError>>>,
        latency: Duration,
    }

    impl ScriptedFetcher {
        fn replying(responses: Vec<Result<String, DeliveryError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                ..Default::default()
            })
        }

        fn slow(latency: Duration, body: &str) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(VecDeque::from([Ok(body.to_string())])),
                latency,
                ..Default::default()
            })
        }

        fn requests(&self) -> Vec<RequestOptions> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, request: &RequestOptions) -> Result<String, DeliveryError> {
            self.requests.lock().unwrap().push(request.clone());
            let response = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()));
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            response
        }
    }

    fn registry(fetcher: Arc<ScriptedFetcher>, fullscreen: bool) -> ConsoleRegistry {
        ConsoleRegistry::new(fetcher, Arc::new(StaticFullscreen(fullscreen)))
    }

    async fn view_lines(registry: &ConsoleRegistry, root: ElementId) -> Vec<String> {
        let doc = registry.document().await;
        let view = doc.find_by_class(root, "console-view")[0];
        doc.html_children(view)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_attach_builds_scaffold() {
        let registry = registry(Arc::default(), false);
        let root = registry.create_element("div").await;
        registry.attach(root, Overrides::new()).await.unwrap();

        let doc = registry.document().await;
        assert!(doc.get(root).unwrap().has_class("console"));
        assert_eq!(doc.find_by_class(root, "console-view").len(), 1);
        assert!(doc.find_by_class(root, "fullscreen").is_empty());
        assert_eq!(
            doc.outer_html(root),
            "<div class=\"console\"><div class=\"console-view\"></div></div>"
        );
    }

    #[tokio::test]
    async fn test_event_mode_renders_in_delivery_order() {
        let registry = registry(Arc::default(), false);
        let root = registry.create_element("div").await;
        registry
            .attach(root, Overrides::new().mode(Mode::Event))
            .await
            .unwrap();

        assert!(registry.dispatch(root, "message", "SUCCESS: ok").await);
        assert!(registry.dispatch(root, "message", "ERROR: bad").await);
        assert!(registry.dispatch(root, "message", "plain").await);

        let lines = view_lines(&registry, root).await;
        assert_eq!(
            lines,
            vec![
                "<p class=\"console-line\"><span class=\"highlight success\">SUCCESS</span>: ok</p>",
                "<p class=\"console-line\"><span class=\"highlight error\">ERROR</span>: bad</p>",
                "<p class=\"console-line\">plain</p>",
            ]
        );

        let doc = registry.document().await;
        let view = doc.find_by_class(root, "console-view")[0];
        assert_eq!(doc.scroll_top(view), doc.scroll_height(view));
    }

    #[tokio::test]
    async fn test_event_mode_ignores_other_events() {
        let registry = registry(Arc::default(), false);
        let root = registry.create_element("div").await;
        registry
            .attach(root, Overrides::new().event_name("log"))
            .await
            .unwrap();

        assert!(!registry.dispatch(root, "message", "ignored").await);
        assert!(registry.dispatch(root, "log", "taken").await);
        assert_eq!(view_lines(&registry, root).await.len(), 1);

        let other = registry.create_element("div").await;
        assert!(!registry.dispatch(other, "log", "nobody home").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_mode_fetches_once_per_interval() {
        let fetcher = ScriptedFetcher::replying(vec![Ok("WARN: slow".to_string())]);
        let registry = registry(fetcher.clone(), false);
        let root = registry.create_element("div").await;
        registry
            .attach(
                root,
                Overrides::new()
                    .mode(Mode::Polling)
                    .endpoint("/log")
                    .poll_interval_ms(200),
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(250)).await;

        let requests = fetcher.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0], RequestOptions::get("/log"));
        assert_eq!(
            view_lines(&registry, root).await,
            vec!["<p class=\"console-line\"><span class=\"highlight warn\">WARN</span>: slow</p>"]
        );
        assert!(registry.status(root).await.unwrap().polling);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_passes_request_options_through() {
        let fetcher = ScriptedFetcher::replying(vec![Ok("done".to_string())]);
        let registry = registry(fetcher.clone(), false);
        let root = registry.create_element("div").await;

        let mut options = RequestOptions::get("/feed");
        options.method = "POST".to_string();
        options.body = Some("cursor=4".to_string());
        options
            .headers
            .insert("accept".to_string(), "text/plain".to_string());

        registry
            .attach(
                root,
                Overrides::new()
                    .mode(Mode::Polling)
                    .endpoint(options.clone())
                    .poll_interval_ms(100),
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fetcher.requests(), vec![options]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detach_stops_polling_and_drops_late_responses() {
        let fetcher = ScriptedFetcher::slow(Duration::from_millis(300), "ERROR: late");
        let registry = registry(fetcher.clone(), false);
        let root = registry.create_element("div").await;
        let handle = registry
            .attach(
                root,
                Overrides::new()
                    .mode(Mode::Polling)
                    .endpoint("/log")
                    .poll_interval_ms(200),
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(fetcher.requests().len(), 1);

        registry.detach(handle).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(fetcher.requests().len(), 1);
        let doc = registry.document().await;
        assert!(doc.find_by_class(root, "console-view").is_empty());
        assert!(!doc.get(root).unwrap().has_class("console"));
        drop(doc);
        assert!(registry.status(root).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_poll_is_fatal_and_reported() {
        let fetcher = ScriptedFetcher::replying(vec![Err(DeliveryError::Status {
            url: "/log".to_string(),
            status: 500,
        })]);
        let registry = registry(fetcher.clone(), false);
        let root = registry.create_element("div").await;
        let handle = registry
            .attach(
                root,
                Overrides::new()
                    .mode(Mode::Polling)
                    .endpoint("/log")
                    .poll_interval_ms(200),
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(fetcher.requests().len(), 1);
        let status = registry.status(root).await.unwrap();
        assert!(!status.polling);
        assert_eq!(
            status.last_error.as_deref(),
            Some("/log answered with status 500")
        );
        assert!(view_lines(&registry, root).await.is_empty());

        let err = registry.detach(handle).await.unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::Delivery(DeliveryError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_second_attach_merges_into_existing_widget() {
        let registry = registry(Arc::default(), false);
        let root = registry.create_element("div").await;
        let first = registry.attach(root, Overrides::new()).await.unwrap();
        let second = registry
            .attach(
                root,
                Overrides::new().highlight_rules(vec![HighlightRule::new("debug", "DEBUG").unwrap()]),
            )
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(
            registry
                .document()
                .await
                .find_by_class(root, "console-view")
                .len(),
            1
        );

        registry.dispatch(root, "message", "ERROR and DEBUG").await;
        assert_eq!(
            view_lines(&registry, root).await,
            vec!["<p class=\"console-line\">ERROR and <span class=\"highlight debug\">DEBUG</span></p>"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_mode_change_does_not_restart_delivery() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let registry = registry(fetcher.clone(), false);
        let root = registry.create_element("div").await;
        let handle = registry.attach(root, Overrides::new()).await.unwrap();

        registry
            .configure(handle, Overrides::new().mode(Mode::Polling).endpoint("/log"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert!(fetcher.requests().is_empty());
        assert!(registry.dispatch(root, "message", "still here").await);
        assert_eq!(registry.status(root).await.unwrap().mode, Mode::Polling);
    }

    #[tokio::test]
    async fn test_invalid_configuration_fails_attach() {
        let registry = registry(Arc::default(), false);
        let root = registry.create_element("div").await;

        let err = registry
            .attach(root, Overrides::new().mode(Mode::Polling))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::Config(ConfigError::MissingEndpoint)
        ));
        assert!(registry.handle(root).await.is_none());
        assert!(registry
            .document()
            .await
            .find_by_class(root, "console-view")
            .is_empty());

        let handle = registry.attach(root, Overrides::new()).await.unwrap();
        let err = registry
            .configure(
                handle,
                Overrides::new()
                    .mode(Mode::Polling)
                    .endpoint("/log")
                    .poll_interval_ms(0),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Config(ConfigError::ZeroInterval)));
    }

    #[tokio::test]
    async fn test_attach_requires_known_element() {
        let registry = registry(Arc::default(), false);
        let root = registry.create_element("div").await;
        registry.document_mut().await.remove(root);

        let err = registry.attach(root, Overrides::new()).await.unwrap_err();
        assert!(matches!(err, ConsoleError::UnknownElement));
    }

    #[tokio::test(start_paused = true)]
    async fn test_removed_root_drops_polling_widget() {
        let fetcher = ScriptedFetcher::replying(vec![Ok("first".to_string())]);
        let registry = registry(fetcher.clone(), false);
        let root = registry.create_element("div").await;
        registry
            .attach(
                root,
                Overrides::new()
                    .mode(Mode::Polling)
                    .endpoint("/log")
                    .poll_interval_ms(200),
            )
            .await
            .unwrap();

        registry.document_mut().await.remove(root);
        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(fetcher.requests().len(), 1);
        assert!(registry.status(root).await.is_none());
        assert!(registry.handle(root).await.is_none());
        assert!(registry.inner.read().await.widgets.is_empty());
        assert!(matches!(
            registry.attach(root, Overrides::new()).await,
            Err(ConsoleError::UnknownElement)
        ));
    }

    #[tokio::test]
    async fn test_removed_root_drops_event_widget() {
        let registry = registry(Arc::default(), false);
        let root = registry.create_element("div").await;
        registry.attach(root, Overrides::new()).await.unwrap();

        registry.document_mut().await.remove(root);

        assert!(registry.handle(root).await.is_none());
        assert!(!registry.dispatch(root, "message", "lost").await);
        assert!(registry.inner.read().await.widgets.is_empty());
        assert!(matches!(
            registry.attach(root, Overrides::new()).await,
            Err(ConsoleError::UnknownElement)
        ));
    }

    #[tokio::test]
    async fn test_unresolvable_endpoint_fails_attach() {
        let registry = ConsoleRegistry::new(
            Arc::new(HttpFetcher::new()),
            Arc::new(StaticFullscreen(false)),
        );
        let root = registry.create_element("div").await;

        let err = registry
            .attach(root, Overrides::new().mode(Mode::Polling).endpoint("/log"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::Delivery(DeliveryError::InvalidUrl(_))
        ));
        assert!(registry.handle(root).await.is_none());
        let doc = registry.document().await;
        assert!(doc.find_by_class(root, "console-view").is_empty());
        assert!(!doc.get(root).unwrap().has_class("console"));
    }

    #[tokio::test]
    async fn test_stale_handle_is_rejected() {
        let registry = registry(Arc::default(), false);
        let root = registry.create_element("div").await;
        let stale = registry.attach(root, Overrides::new()).await.unwrap();
        registry.detach(stale).await.unwrap();
        let fresh = registry.attach(root, Overrides::new()).await.unwrap();

        assert_ne!(stale, fresh);
        assert!(matches!(
            registry.detach(stale).await,
            Err(ConsoleError::UnknownWidget)
        ));
        assert!(registry.handle(root).await.is_some());
    }

    #[tokio::test]
    async fn test_socket_mode_never_delivers() {
        let registry = registry(Arc::default(), false);
        let root = registry.create_element("div").await;
        registry
            .attach(root, Overrides::new().mode(Mode::Socket))
            .await
            .unwrap();

        assert!(!registry.dispatch(root, "message", "ERROR").await);
        assert!(view_lines(&registry, root).await.is_empty());
    }

    #[tokio::test]
    async fn test_fullscreen_control_toggles() {
        let registry = registry(Arc::default(), true);
        let root = registry.create_element("div").await;
        registry.attach(root, Overrides::new()).await.unwrap();

        let (control, icon) = {
            let doc = registry.document().await;
            assert_eq!(
                doc.outer_html(root),
                "<div class=\"console\"><div class=\"fullscreen\"><span class=\"glyphicon glyphicon-fullscreen\"></span></div><div class=\"console-view\"></div></div>"
            );
            (
                doc.find_by_class(root, "fullscreen")[0],
                doc.find_by_class(root, "glyphicon-fullscreen")[0],
            )
        };

        assert!(registry.click(icon).await);
        assert_eq!(registry.document().await.fullscreen_element(), Some(root));
        assert!(registry.status(root).await.unwrap().fullscreen);

        assert!(registry.click(control).await);
        assert_eq!(registry.document().await.fullscreen_element(), None);

        assert!(!registry.click(root).await);
    }
}
