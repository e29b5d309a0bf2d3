//! Element location with ordered strategy fallback.
//!
//! Targets in the POS frontend rarely carry stable ids, so every lookup
//! carries a chain of strategies (CSS, XPath, text match, ancestor-of-text,
//! attribute fragment). [`Locator::locate`] tries them in priority order and
//! returns the first visible match.

use std::fmt;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::dom::{Browser, BoxedElement, Element};
use crate::error::DriverError;

/// One way of finding an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    Css(String),
    XPath(String),
    /// Element of `tag` whose normalized text equals `text`.
    Text { tag: String, text: String },
    /// Element of `tag` whose normalized text contains `text`.
    TextContains { tag: String, text: String },
    /// Nearest ancestor carrying class fragment `ancestor` of any node whose
    /// text contains `text`.
    AncestorOfText { text: String, ancestor: String },
    /// Element of `tag` whose attribute `attr` contains `value`. With
    /// `attr = "style"` this matches inline style fragments.
    AttrContains {
        tag: String,
        attr: String,
        value: String,
    },
}

impl Strategy {
    pub fn css(selector: &str) -> Self {
        Strategy::Css(selector.to_string())
    }

    pub fn xpath(expr: &str) -> Self {
        Strategy::XPath(expr.to_string())
    }

    pub fn text(tag: &str, text: &str) -> Self {
        Strategy::Text {
            tag: tag.to_string(),
            text: text.to_string(),
        }
    }

    pub fn text_contains(tag: &str, text: &str) -> Self {
        Strategy::TextContains {
            tag: tag.to_string(),
            text: text.to_string(),
        }
    }

    pub fn ancestor_of_text(text: &str, ancestor: &str) -> Self {
        Strategy::AncestorOfText {
            text: text.to_string(),
            ancestor: ancestor.to_string(),
        }
    }

    pub fn attr_contains(tag: &str, attr: &str, value: &str) -> Self {
        Strategy::AttrContains {
            tag: tag.to_string(),
            attr: attr.to_string(),
            value: value.to_string(),
        }
    }

    /// XPath expression for the structured variants. `Css` has none.
    #[must_use]
    pub fn to_xpath(&self) -> Option<String> {
        match self {
            Strategy::Css(_) => None,
            Strategy::XPath(expr) => Some(expr.clone()),
            Strategy::Text { tag, text } => Some(format!(
                "//{tag}[normalize-space()={}]",
                xpath_literal(text)
            )),
            Strategy::TextContains { tag, text } => Some(format!(
                "//{tag}[contains(normalize-space(), {})]",
                xpath_literal(text)
            )),
            Strategy::AncestorOfText { text, ancestor } => Some(format!(
                "//*[contains(normalize-space(), {})]/ancestor::*[contains(@class, {})][1]",
                xpath_literal(text),
                xpath_literal(ancestor)
            )),
            Strategy::AttrContains { tag, attr, value } => Some(format!(
                "//{tag}[contains(@{attr}, {})]",
                xpath_literal(value)
            )),
        }
    }

    /// WebDriver locator for this strategy.
    #[must_use]
    pub fn to_by(&self) -> thirtyfour::By {
        use thirtyfour::By;
        match self.to_xpath() {
            Some(expr) => By::XPath(expr.as_str()),
            None => match self {
                Strategy::Css(sel) => By::Css(sel.as_str()),
                _ => unreachable!("every non-CSS strategy compiles to XPath"),
            },
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Css(sel) => write!(f, "css:{sel}"),
            Strategy::XPath(expr) => write!(f, "xpath:{expr}"),
            Strategy::Text { tag, text } => write!(f, "text={tag}:{text}"),
            Strategy::TextContains { tag, text } => write!(f, "text*={tag}:{text}"),
            Strategy::AncestorOfText { text, ancestor } => {
                write!(f, "ancestor={ancestor}:{text}")
            }
            Strategy::AttrContains { tag, attr, value } => {
                write!(f, "attr={tag}@{attr}*={value}")
            }
        }
    }
}

/// Quotes a string as an XPath literal. Strings containing both quote kinds
/// fall back to `concat()`.
fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{value}'")
    } else if !value.contains('"') {
        format!("\"{value}\"")
    } else {
        let parts: Vec<String> = value
            .split('\'')
            .map(|part| format!("'{part}'"))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// A successful lookup, with the strategies that missed before the hit.
pub struct Hit {
    pub element: BoxedElement,
    pub failed_attempts: Vec<String>,
}

impl std::fmt::Debug for Hit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hit")
            .field("failed_attempts", &self.failed_attempts)
            .finish_non_exhaustive()
    }
}

/// Polling element finder with a bounded total wait.
#[derive(Debug, Clone)]
pub struct Locator {
    timeout: Duration,
    poll: Duration,
}

impl Locator {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Locator {
            timeout,
            poll: Duration::from_millis(250),
        }
    }

    #[must_use]
    pub fn with_poll(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }

    /// Finds `target` by trying each strategy in order.
    ///
    /// The total timeout is split evenly across strategies, so a dead first
    /// strategy cannot starve the rest of the chain. Only visible elements
    /// count as found.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::LocatorExhausted`] when every strategy fails,
    /// carrying one failure entry per attempted strategy.
    pub async fn locate(
        &self,
        browser: &dyn Browser,
        target: &str,
        strategies: &[Strategy],
    ) -> Result<Hit, DriverError> {
        let mut failed_attempts = Vec::new();
        if strategies.is_empty() {
            return Err(DriverError::LocatorExhausted {
                target: target.to_string(),
                attempts: failed_attempts,
            });
        }

        let budget = per_strategy_budget(self.timeout, self.poll, strategies.len());
        for strategy in strategies {
            let deadline = Instant::now() + budget;
            let mut last_miss = "no visible match".to_string();
            loop {
                match browser.find(strategy).await {
                    Ok(elem) => {
                        if elem.is_displayed().await.unwrap_or(false) {
                            tracing::debug!(target, %strategy, "located element");
                            return Ok(Hit {
                                element: elem,
                                failed_attempts,
                            });
                        }
                        last_miss = "matched but not visible".to_string();
                    }
                    Err(err) => {
                        tracing::trace!(target, %strategy, %err, "lookup miss");
                        last_miss = err.to_string();
                    }
                }
                if Instant::now() >= deadline {
                    break;
                }
                sleep(self.poll).await;
            }
            tracing::debug!(target, %strategy, "strategy exhausted, falling through");
            failed_attempts.push(format!("{strategy}: {last_miss}"));
        }

        tracing::warn!(target, attempts = failed_attempts.len(), "no strategy matched");
        Err(DriverError::LocatorExhausted {
            target: target.to_string(),
            attempts: failed_attempts,
        })
    }

    /// All matches for the first strategy that yields a non-empty set.
    ///
    /// Returns `Ok(vec![])` when no strategy matches anything within the
    /// timeout; an empty listing page is not an error.
    pub async fn locate_all(
        &self,
        browser: &dyn Browser,
        target: &str,
        strategies: &[Strategy],
    ) -> Result<Vec<BoxedElement>, DriverError> {
        let budget = per_strategy_budget(self.timeout, self.poll, strategies.len().max(1));
        for strategy in strategies {
            let deadline = Instant::now() + budget;
            loop {
                match browser.find_all(strategy).await {
                    Ok(elems) if !elems.is_empty() => {
                        tracing::debug!(target, %strategy, count = elems.len(), "located elements");
                        return Ok(elems);
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::trace!(target, %strategy, %err, "lookup miss");
                    }
                }
                if Instant::now() >= deadline {
                    break;
                }
                sleep(self.poll).await;
            }
        }
        Ok(vec![])
    }

    /// Waits until any one of `strategies` matches a visible element and
    /// returns its index together with the element. All alternatives are
    /// polled each cycle, so this races outcomes rather than trying them in
    /// sequence.
    pub async fn wait_for_any(
        &self,
        browser: &dyn Browser,
        target: &str,
        strategies: &[Strategy],
    ) -> Result<(usize, BoxedElement), DriverError> {
        let started = Instant::now();
        let deadline = started + self.timeout;
        loop {
            for (idx, strategy) in strategies.iter().enumerate() {
                if let Ok(elem) = browser.find(strategy).await {
                    if elem.is_displayed().await.unwrap_or(false) {
                        return Ok((idx, elem));
                    }
                }
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout {
                    target: target.to_string(),
                    strategy: strategies
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(" | "),
                    waited_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                });
            }
            sleep(self.poll).await;
        }
    }

    /// Waits until the browser URL contains `fragment`.
    pub async fn wait_for_url(
        &self,
        browser: &dyn Browser,
        fragment: &str,
    ) -> Result<(), DriverError> {
        let started = Instant::now();
        let deadline = started + self.timeout;
        loop {
            if browser.current_url().await?.contains(fragment) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout {
                    target: format!("url containing {fragment:?}"),
                    strategy: "url-poll".to_string(),
                    waited_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                });
            }
            sleep(self.poll).await;
        }
    }
}

fn per_strategy_budget(total: Duration, poll: Duration, strategies: usize) -> Duration {
    let n = u32::try_from(strategies).unwrap_or(u32::MAX).max(1);
    (total / n).max(poll)
}

/// Clicks an element, escalating through click methods.
///
/// Each method is retried up to the bound with a pause between attempts
/// before escalating to the next one: native click, then scripted click,
/// then the Enter key. Vuetify overlays routinely swallow the native
/// click, so the scripted fallback carries most of the weight.
///
/// # Errors
///
/// Returns [`DriverError::ClickRejected`] once every method is exhausted.
pub async fn click_any_way(
    elem: &dyn Element,
    target: &str,
    retries: u32,
    pause: Duration,
) -> Result<(), DriverError> {
    for attempt in 0..=retries {
        match elem.click().await {
            Ok(()) => return Ok(()),
            Err(err) => tracing::debug!(target, attempt, %err, "native click rejected"),
        }
        sleep(pause).await;
    }
    for attempt in 0..=retries {
        match elem.script_click().await {
            Ok(()) => return Ok(()),
            Err(err) => tracing::debug!(target, attempt, %err, "scripted click rejected"),
        }
        sleep(pause).await;
    }
    for attempt in 0..=retries {
        match elem.press_enter().await {
            Ok(()) => return Ok(()),
            Err(err) => tracing::debug!(target, attempt, %err, "enter key rejected"),
        }
        if attempt < retries {
            sleep(pause).await;
        }
    }
    Err(DriverError::ClickRejected {
        target: target.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{ClickEffect, FakeBrowser, FakeNode};

    fn quick_locator() -> Locator {
        Locator::new(Duration::from_millis(200)).with_poll(Duration::from_millis(10))
    }

    #[test]
    fn text_strategy_compiles_to_normalized_xpath() {
        let expr = Strategy::text("button", "INICIAR SESION").to_xpath();
        assert_eq!(
            expr.as_deref(),
            Some("//button[normalize-space()='INICIAR SESION']")
        );
    }

    #[test]
    fn ancestor_strategy_picks_nearest_matching_ancestor() {
        let expr = Strategy::ancestor_of_text("Mesa 4", "v-card")
            .to_xpath()
            .expect("structured strategy has an xpath");
        assert!(expr.contains("ancestor::*[contains(@class, 'v-card')][1]"));
    }

    #[test]
    fn xpath_literal_handles_apostrophes() {
        assert_eq!(xpath_literal("plain"), "'plain'");
        assert_eq!(xpath_literal("it's"), "\"it's\"");
        assert_eq!(
            xpath_literal(r#"a'b"c"#),
            r#"concat('a', "'", 'b"c')"#
        );
    }

    #[tokio::test]
    async fn locate_falls_through_to_later_strategy() {
        let browser = FakeBrowser::single_page(
            "https://pos.test/panel",
            vec![FakeNode::new("btn", &["text=button:OPCIONES"]).text("OPCIONES")],
        );

        let strategies = [
            Strategy::css("#does-not-exist"),
            Strategy::text("button", "OPCIONES"),
        ];
        let hit = quick_locator()
            .locate(&browser, "options button", &strategies)
            .await
            .expect("second strategy should match");
        assert_eq!(hit.element.text().await.unwrap(), "OPCIONES");
        assert_eq!(hit.failed_attempts.len(), 1);
        assert!(hit.failed_attempts[0].starts_with("css:#does-not-exist"));
    }

    #[tokio::test]
    async fn only_last_of_three_strategies_matching_records_two_failures() {
        let browser = FakeBrowser::single_page(
            "https://pos.test/panel",
            vec![FakeNode::new("card", &["ancestor=v-card:Mesa 4"]).text("Mesa 4")],
        );

        let strategies = [
            Strategy::text("h2", "Mesa 4"),
            Strategy::css(".mesa-card"),
            Strategy::ancestor_of_text("Mesa 4", "v-card"),
        ];
        let hit = quick_locator()
            .locate(&browser, "table card", &strategies)
            .await
            .expect("last strategy should match");
        assert_eq!(hit.failed_attempts.len(), 2);
        assert!(hit.failed_attempts[0].starts_with("text=h2:Mesa 4"));
        assert!(hit.failed_attempts[1].starts_with("css:.mesa-card"));
    }

    #[tokio::test]
    async fn locate_skips_hidden_elements() {
        let browser = FakeBrowser::single_page(
            "https://pos.test/panel",
            vec![FakeNode::new("ghost", &["css:.overlay"]).hidden()],
        );

        let err = quick_locator()
            .locate(&browser, "overlay", &[Strategy::css(".overlay")])
            .await
            .unwrap_err();
        match err {
            DriverError::LocatorExhausted { attempts, .. } => {
                assert_eq!(attempts.len(), 1);
                assert!(attempts[0].contains("matched but not visible"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn locate_reports_attempt_count_on_exhaustion() {
        let browser = FakeBrowser::single_page("https://pos.test/panel", vec![]);
        let strategies = [
            Strategy::css("#a"),
            Strategy::css("#b"),
            Strategy::text("div", "nope"),
        ];
        let err = quick_locator()
            .locate(&browser, "missing", &strategies)
            .await
            .unwrap_err();
        match err {
            DriverError::LocatorExhausted { target, attempts } => {
                assert_eq!(target, "missing");
                assert_eq!(attempts.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn locate_all_returns_empty_for_empty_listing() {
        let browser = FakeBrowser::single_page("https://pos.test/panel", vec![]);
        let elems = quick_locator()
            .locate_all(&browser, "table cards", &[Strategy::css(".v-card--link")])
            .await
            .expect("empty listing is not an error");
        assert!(elems.is_empty());
    }

    #[tokio::test]
    async fn wait_for_any_reports_which_alternative_matched() {
        let browser = FakeBrowser::single_page(
            "https://pos.test/panel",
            vec![FakeNode::new("err", &["css:.error-toast"]).text("Credenciales incorrectas")],
        );

        let (idx, elem) = quick_locator()
            .wait_for_any(
                &browser,
                "login outcome",
                &[Strategy::css(".panel-root"), Strategy::css(".error-toast")],
            )
            .await
            .expect("toast should match");
        assert_eq!(idx, 1);
        assert_eq!(elem.text().await.unwrap(), "Credenciales incorrectas");
    }

    #[tokio::test]
    async fn click_any_way_recovers_after_transient_rejections() {
        let browser = FakeBrowser::single_page(
            "https://pos.test/panel",
            vec![FakeNode::new("btn", &["css:#save"])
                .text("GUARDAR")
                .on_click(ClickEffect::FailTimes(2))],
        );

        let elem = quick_locator()
            .locate(&browser, "save", &[Strategy::css("#save")])
            .await
            .unwrap()
            .element;
        click_any_way(elem.as_ref(), "save", 3, Duration::from_millis(5))
            .await
            .expect("third native attempt should land");
        assert_eq!(browser.clicks("btn"), 1);
    }

    #[tokio::test]
    async fn click_any_way_exhausts_each_method_before_escalating() {
        // Two rejections with one retry per method: both native attempts
        // fail, the first scripted attempt lands, and the Enter key is
        // never reached.
        let browser = FakeBrowser::single_page(
            "https://pos.test/panel",
            vec![FakeNode::new("btn", &["css:#save"])
                .text("GUARDAR")
                .on_click(ClickEffect::FailTimes(2))],
        );

        let elem = quick_locator()
            .locate(&browser, "save", &[Strategy::css("#save")])
            .await
            .unwrap()
            .element;
        click_any_way(elem.as_ref(), "save", 1, Duration::from_millis(5))
            .await
            .expect("first scripted attempt should land");
        assert_eq!(browser.clicks("btn"), 1);
        assert_eq!(browser.enter_presses("btn"), 0);
    }

    #[tokio::test]
    async fn click_any_way_gives_up_after_bounded_rounds() {
        let browser = FakeBrowser::single_page(
            "https://pos.test/panel",
            vec![FakeNode::new("btn", &["css:#save"])
                .on_click(ClickEffect::FailTimes(u32::MAX))],
        );

        let elem = quick_locator()
            .locate(&browser, "save", &[Strategy::css("#save")])
            .await
            .unwrap()
            .element;
        let err = click_any_way(elem.as_ref(), "save", 1, Duration::from_millis(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::ClickRejected { .. }));
    }
}
