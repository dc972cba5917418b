//! In-memory [`UiDriver`] for tests.
//!
//! Pages are scripted per URL as a flat list of elements. Time is virtual:
//! [`UiDriver::pause`] advances a clock instead of sleeping, so the long
//! waits used against live pages cost nothing here.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

use crate::config::{InvitationLocators, LoginConfig, ProfileLocators};
use crate::driver::{ElementRef, Locator, UiDriver};
use crate::error::DriverError;

const LISTING_PREFIX: &str = "listing-";
const DEFAULT_EXTENT: u64 = 1_000;

/// An infinite-scroll listing whose size grows with each bottom scroll.
#[derive(Debug, Clone)]
pub struct ListingScript {
    locator: Locator,
    extent_per_item: u64,
    growth: Vec<usize>,
    padding_growth: u64,
    arrival_delay: Duration,
    hrefs: Vec<String>,
}

impl ListingScript {
    pub fn new(locator: Locator, extent_per_item: u64) -> Self {
        Self {
            locator,
            extent_per_item,
            growth: Vec::new(),
            padding_growth: 0,
            arrival_delay: Duration::ZERO,
            hrefs: Vec::new(),
        }
    }

    /// Entity count after 0, 1, 2, ... bottom scrolls. The last value holds
    /// for every later scroll.
    pub fn growth(mut self, counts: &[usize]) -> Self {
        self.growth = counts.to_vec();
        self
    }

    /// Extra page height added by every bottom scroll regardless of content.
    pub fn padding_growth(mut self, per_scroll: u64) -> Self {
        self.padding_growth = per_scroll;
        self
    }

    /// Content triggered by a scroll only shows up after `delay`.
    pub fn arrives_late(mut self, delay: Duration) -> Self {
        self.arrival_delay = delay;
        self
    }

    /// `href` values for the first entities; later ones get generated links.
    pub fn hrefs(mut self, hrefs: &[&str]) -> Self {
        self.hrefs = hrefs.iter().map(|h| h.to_string()).collect();
        self
    }

    fn href(&self, index: usize) -> String {
        self.hrefs
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("/companies/entity-{}", index))
    }
}

/// When a scripted element is present on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    Always,
    /// Present while the given element has been clicked an odd number of
    /// times (a toggled menu).
    WhileOpen(String),
    /// Present once the given element has been clicked.
    AfterClick(String),
    /// Present after this many bottom scrolls (lazily loaded content).
    AfterScrolls(usize),
}

#[derive(Debug, Clone)]
pub struct ScriptedElement {
    id: String,
    matches: Vec<Locator>,
    attributes: HashMap<String, String>,
    text: String,
    parent: Option<String>,
    visibility: Visibility,
    removed_by: Vec<String>,
    fail_click: bool,
}

impl ScriptedElement {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            matches: Vec::new(),
            attributes: HashMap::new(),
            text: String::new(),
            parent: None,
            visibility: Visibility::Always,
            removed_by: Vec::new(),
            fail_click: false,
        }
    }

    pub fn matching(mut self, locator: &Locator) -> Self {
        self.matches.push(locator.clone());
        self
    }

    pub fn classes(self, classes: &str) -> Self {
        self.attr("class", classes)
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn child_of(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn visible(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Gone from the page once any of `triggers` has been clicked.
    pub fn removed_on_click(mut self, triggers: &[&str]) -> Self {
        self.removed_by = triggers.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn failing_click(mut self) -> Self {
        self.fail_click = true;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedPage {
    elements: Vec<ScriptedElement>,
}

impl ScriptedPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, element: ScriptedElement) -> Self {
        self.elements.push(element);
        self
    }
}

pub struct ScriptedDriver {
    now: Duration,
    listing: Option<ListingScript>,
    bottom_scroll_times: Vec<Duration>,
    top_scrolls: u32,
    fraction_scrolls: Vec<f64>,
    pages: HashMap<String, ScriptedPage>,
    current: Option<String>,
    clicks: HashMap<String, u32>,
    click_log: Vec<String>,
    typed: Vec<(String, String)>,
    visited: Vec<String>,
    fail_navigation: bool,
    unreachable: HashSet<String>,
    fail_extent: bool,
    quits: Rc<Cell<u32>>,
}

impl Default for ScriptedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            listing: None,
            bottom_scroll_times: Vec::new(),
            top_scrolls: 0,
            fraction_scrolls: Vec::new(),
            pages: HashMap::new(),
            current: None,
            clicks: HashMap::new(),
            click_log: Vec::new(),
            typed: Vec::new(),
            visited: Vec::new(),
            fail_navigation: false,
            unreachable: HashSet::new(),
            fail_extent: false,
            quits: Rc::new(Cell::new(0)),
        }
    }

    pub fn with_listing(mut self, listing: ListingScript) -> Self {
        self.listing = Some(listing);
        self
    }

    pub fn with_page(mut self, url: &str, page: ScriptedPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    /// Every navigation fails.
    pub fn fail_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    /// Navigation to `url` fails.
    pub fn unreachable(mut self, url: &str) -> Self {
        self.unreachable.insert(url.to_string());
        self
    }

    pub fn fail_extent_reads(mut self) -> Self {
        self.fail_extent = true;
        self
    }

    pub fn bottom_scrolls(&self) -> usize {
        self.bottom_scroll_times.len()
    }

    pub fn top_scrolls(&self) -> u32 {
        self.top_scrolls
    }

    pub fn fraction_scrolls(&self) -> &[f64] {
        &self.fraction_scrolls
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.clone()
    }

    /// Element ids in click order, across all pages.
    pub fn clicked(&self) -> &[String] {
        &self.click_log
    }

    /// `(element id, text)` pairs in typing order.
    pub fn typed(&self) -> &[(String, String)] {
        &self.typed
    }

    pub fn elapsed(&self) -> Duration {
        self.now
    }

    /// Shared counter of `quit` calls, readable after the driver is moved.
    pub fn quit_counter(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.quits)
    }

    fn listing_count(&self) -> usize {
        let Some(listing) = &self.listing else {
            return 0;
        };
        let Some(last) = listing.growth.len().checked_sub(1) else {
            return 0;
        };
        let arrived = self
            .bottom_scroll_times
            .iter()
            .filter(|at| **at + listing.arrival_delay <= self.now)
            .count();
        listing.growth[arrived.min(last)]
    }

    fn listing_index(&self, element: &ElementRef) -> Option<usize> {
        let index: usize = element.id().strip_prefix(LISTING_PREFIX)?.parse().ok()?;
        (index < self.listing_count()).then_some(index)
    }

    fn page(&self) -> Option<&ScriptedPage> {
        self.current.as_ref().and_then(|url| self.pages.get(url))
    }

    fn clicks_on(&self, id: &str) -> u32 {
        self.clicks.get(id).copied().unwrap_or(0)
    }

    /// An element is only present while its parent is.
    fn is_visible(&self, element: &ScriptedElement) -> bool {
        let shown = match &element.visibility {
            Visibility::Always => true,
            Visibility::WhileOpen(trigger) => self.clicks_on(trigger) % 2 == 1,
            Visibility::AfterClick(trigger) => self.clicks_on(trigger) > 0,
            Visibility::AfterScrolls(scrolls) => self.bottom_scroll_times.len() >= *scrolls,
        };
        if !shown || element.removed_by.iter().any(|id| self.clicks_on(id) > 0) {
            return false;
        }
        match &element.parent {
            Some(parent) => self
                .page()
                .and_then(|page| page.elements.iter().find(|e| &e.id == parent))
                .map_or(true, |parent| self.is_visible(parent)),
            None => true,
        }
    }

    fn visible_element(&self, element: &ElementRef) -> Result<&ScriptedElement, DriverError> {
        self.page()
            .and_then(|page| page.elements.iter().find(|e| e.id == element.id()))
            .filter(|e| self.is_visible(e))
            .ok_or_else(|| DriverError::StaleElement(element.id().to_string()))
    }

    fn visible_matching(&self, locator: &Locator) -> Vec<ElementRef> {
        self.page()
            .map(|page| {
                page.elements
                    .iter()
                    .filter(|e| e.matches.contains(locator) && self.is_visible(e))
                    .map(|e| ElementRef::new(e.id.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl UiDriver for ScriptedDriver {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        if self.fail_navigation || self.unreachable.contains(url) {
            return Err(DriverError::Scripted(format!("navigation to {} refused", url)));
        }
        self.visited.push(url.to_string());
        self.current = Some(url.to_string());
        self.clicks.clear();
        Ok(())
    }

    fn current_extent(&mut self) -> Result<u64, DriverError> {
        if self.fail_extent {
            return Err(DriverError::Scripted("extent unavailable".to_string()));
        }
        Ok(match &self.listing {
            Some(listing) => {
                self.listing_count() as u64 * listing.extent_per_item
                    + listing.padding_growth * self.bottom_scroll_times.len() as u64
            }
            None => DEFAULT_EXTENT,
        })
    }

    fn scroll_to_bottom(&mut self) -> Result<(), DriverError> {
        self.bottom_scroll_times.push(self.now);
        Ok(())
    }

    fn scroll_to_top(&mut self) -> Result<(), DriverError> {
        self.top_scrolls += 1;
        Ok(())
    }

    fn scroll_to_fraction(&mut self, fraction: f64) -> Result<(), DriverError> {
        self.fraction_scrolls.push(fraction);
        Ok(())
    }

    fn find(&mut self, locator: &Locator) -> Result<Vec<ElementRef>, DriverError> {
        if let Some(listing) = &self.listing {
            if &listing.locator == locator {
                return Ok((0..self.listing_count())
                    .map(|i| ElementRef::new(format!("{}{}", LISTING_PREFIX, i)))
                    .collect());
            }
        }
        Ok(self.visible_matching(locator))
    }

    fn find_within(
        &mut self,
        parent: &ElementRef,
        locator: &Locator,
    ) -> Result<Vec<ElementRef>, DriverError> {
        let scope = self.visible_element(parent)?;
        if locator.value() == ".." {
            let Some(up) = scope.parent.clone() else {
                return Ok(Vec::new());
            };
            let up = ElementRef::new(up);
            return Ok(self.visible_element(&up).map(|_| vec![up]).unwrap_or_default());
        }

        let scope_id = scope.id.clone();
        Ok(self
            .page()
            .map(|page| {
                page.elements
                    .iter()
                    .filter(|e| {
                        e.parent.as_deref() == Some(scope_id.as_str())
                            && e.matches.contains(locator)
                            && self.is_visible(e)
                    })
                    .map(|e| ElementRef::new(e.id.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn click(&mut self, element: &ElementRef) -> Result<(), DriverError> {
        if self.listing_index(element).is_none() {
            let target = self.visible_element(element)?;
            if target.fail_click {
                return Err(DriverError::Scripted(format!(
                    "element {} is not interactable",
                    element.id()
                )));
            }
        }
        *self.clicks.entry(element.id().to_string()).or_insert(0) += 1;
        self.click_log.push(element.id().to_string());
        Ok(())
    }

    fn type_text(&mut self, element: &ElementRef, text: &str) -> Result<(), DriverError> {
        self.visible_element(element)?;
        self.typed.push((element.id().to_string(), text.to_string()));
        Ok(())
    }

    fn text(&mut self, element: &ElementRef) -> Result<String, DriverError> {
        Ok(self.visible_element(element)?.text.clone())
    }

    fn attribute(
        &mut self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        if let Some(index) = self.listing_index(element) {
            return Ok(match (name, &self.listing) {
                ("href", Some(listing)) => Some(listing.href(index)),
                _ => None,
            });
        }
        Ok(self.visible_element(element)?.attributes.get(name).cloned())
    }

    fn pause(&mut self, duration: Duration) {
        self.now += duration;
    }

    fn quit(&mut self) -> Result<(), DriverError> {
        self.quits.set(self.quits.get() + 1);
        Ok(())
    }
}

// ── Page fixtures ──

/// Profile page layouts, built against the default profile locators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFixture {
    /// "Remove connection" in the overflow menu.
    Connected,
    /// Inert "Pending" button.
    Pending,
    /// "Connect" only inside the overflow menu.
    ConnectInMenu,
    /// "Connect" button on the header.
    ConnectDirect,
    /// Header button that opens the email verification dialog.
    ConnectNeedsEmail,
    /// Header button that errors when clicked.
    ConnectBroken,
    /// "Connect" label on a muted button, e.g. a sidebar suggestion.
    ConnectMuted,
    /// Only a "Message" button.
    Empty,
}

pub const CONNECT_BUTTON_CLASSES: &str =
    "artdeco-button artdeco-button--2 artdeco-button--primary ember-view pvs-profile-actions__action";
pub const PENDING_BUTTON_CLASSES: &str =
    "artdeco-button artdeco-button--2 artdeco-button--secondary ember-view";

pub fn profile_page(fixture: ProfileFixture) -> ScriptedPage {
    let locators = ProfileLocators::default();
    let page = ScriptedPage::new().with(ScriptedElement::new("message").text("Message"));

    match fixture {
        ProfileFixture::Connected => with_menu(page, &locators)
            .with(menu_item("menu-remove", &locators.menu_remove_connection, "Remove connection")),
        ProfileFixture::Pending => page.with(
            ScriptedElement::new("pending")
                .matching(&locators.pending_button)
                .classes(PENDING_BUTTON_CLASSES)
                .text("Pending"),
        ),
        ProfileFixture::ConnectInMenu => with_confirm(
            with_menu(page, &locators).with(menu_item("menu-connect", &locators.menu_connect, "Connect")),
            &locators,
            "menu-connect",
        ),
        ProfileFixture::ConnectDirect => with_confirm(
            with_direct_button(page, &locators, CONNECT_BUTTON_CLASSES, false),
            &locators,
            "connect-button",
        ),
        ProfileFixture::ConnectNeedsEmail => with_direct_button(page, &locators, CONNECT_BUTTON_CLASSES, false)
            .with(
                ScriptedElement::new("email-input")
                    .matching(&locators.email_dialog)
                    .visible(Visibility::AfterClick("connect-button".to_string())),
            )
            .with(
                ScriptedElement::new("dialog-dismiss")
                    .matching(&locators.dialog_dismiss)
                    .visible(Visibility::AfterClick("connect-button".to_string())),
            ),
        ProfileFixture::ConnectBroken => {
            with_direct_button(page, &locators, CONNECT_BUTTON_CLASSES, true)
        }
        ProfileFixture::ConnectMuted => with_direct_button(
            page,
            &locators,
            "artdeco-button artdeco-button--2 artdeco-button--muted ember-view",
            false,
        ),
        ProfileFixture::Empty => page,
    }
}

/// Login form that signs in once submitted, or shows the signed-in marker
/// straight away when `already_signed_in` is set.
pub fn login_page(config: &LoginConfig, already_signed_in: bool) -> ScriptedPage {
    if already_signed_in {
        return ScriptedPage::new().with(ScriptedElement::new("feed").matching(&config.logged_in_marker));
    }
    login_form(config).with(
        ScriptedElement::new("feed")
            .matching(&config.logged_in_marker)
            .visible(Visibility::AfterClick("login-submit".to_string())),
    )
}

/// Login form that never reaches the signed-in state (e.g. a checkpoint).
pub fn rejecting_login_page(config: &LoginConfig) -> ScriptedPage {
    login_form(config)
}

fn login_form(config: &LoginConfig) -> ScriptedPage {
    ScriptedPage::new()
        .with(ScriptedElement::new("login-username").matching(&config.username_field))
        .with(ScriptedElement::new("login-password").matching(&config.password_field))
        .with(ScriptedElement::new("login-submit").matching(&config.submit_button))
}

fn with_menu(page: ScriptedPage, locators: &ProfileLocators) -> ScriptedPage {
    page.with(
        ScriptedElement::new("more")
            .matching(&locators.more_button)
            .classes("artdeco-dropdown__trigger artdeco-button")
            .text("More"),
    )
}

fn menu_item(id: &str, locator: &Locator, text: &str) -> ScriptedElement {
    ScriptedElement::new(id)
        .matching(locator)
        .text(text)
        .visible(Visibility::WhileOpen("more".to_string()))
}

fn with_direct_button(
    page: ScriptedPage,
    locators: &ProfileLocators,
    classes: &str,
    broken: bool,
) -> ScriptedPage {
    let mut button = ScriptedElement::new("connect-button").classes(classes);
    if broken {
        button = button.failing_click();
    }
    page.with(button).with(
        ScriptedElement::new("connect-label")
            .matching(&locators.connect_label)
            .classes("artdeco-button__text")
            .text("Connect")
            .child_of("connect-button"),
    )
}

fn with_confirm(page: ScriptedPage, locators: &ProfileLocators, after: &str) -> ScriptedPage {
    page.with(
        ScriptedElement::new("send-without-note")
            .matching(&locators.send_without_note)
            .classes("artdeco-button artdeco-button--2 artdeco-button--primary")
            .text("Send without a note")
            .visible(Visibility::AfterClick(after.to_string())),
    )
}

/// One card on the received-invitations page.
#[derive(Debug, Clone)]
pub struct InvitationCard {
    index: usize,
    name: String,
    headline: Option<String>,
    mutual: Option<String>,
    sent: Option<String>,
    verified: bool,
    follows_you: bool,
    after_scrolls: usize,
    name_in_label_only: bool,
    with_link: bool,
    failing_accept: bool,
}

impl InvitationCard {
    /// An empty `name` gives a card with no readable name at all.
    pub fn new(index: usize, name: &str) -> Self {
        Self {
            index,
            name: name.to_string(),
            headline: None,
            mutual: None,
            sent: None,
            verified: false,
            follows_you: false,
            after_scrolls: 0,
            name_in_label_only: false,
            with_link: true,
            failing_accept: false,
        }
    }

    pub fn headline(mut self, headline: &str) -> Self {
        self.headline = Some(headline.to_string());
        self
    }

    pub fn mutual(mut self, line: &str) -> Self {
        self.mutual = Some(line.to_string());
        self
    }

    pub fn sent(mut self, line: &str) -> Self {
        self.sent = Some(line.to_string());
        self
    }

    pub fn verified(mut self) -> Self {
        self.verified = true;
        self
    }

    pub fn follows_you(mut self) -> Self {
        self.follows_you = true;
        self
    }

    /// Loaded only after this many bottom scrolls.
    pub fn after_scrolls(mut self, scrolls: usize) -> Self {
        self.after_scrolls = scrolls;
        self
    }

    /// No bold name element; the name is only in the picture link label.
    pub fn name_only_in_label(mut self) -> Self {
        self.name_in_label_only = true;
        self
    }

    pub fn without_link(mut self) -> Self {
        self.with_link = false;
        self
    }

    /// The accept button errors when clicked.
    pub fn failing_accept(mut self) -> Self {
        self.failing_accept = true;
        self
    }

    pub fn profile_url(&self) -> String {
        format!("https://www.linkedin.com/in/inviter-{}", self.index)
    }

    fn elements(&self, locators: &InvitationLocators) -> Vec<ScriptedElement> {
        let card_id = format!("invitation-{}", self.index);
        let accept_id = format!("accept-{}", self.index);
        let ignore_id = format!("ignore-{}", self.index);
        let part = |suffix: &str| {
            ScriptedElement::new(&format!("{}-{}", card_id, suffix)).child_of(&card_id)
        };

        let mut lines = Vec::new();
        if !self.name.is_empty() && !self.name_in_label_only {
            lines.push(self.name.clone());
        }
        lines.extend(self.headline.iter().cloned());
        lines.extend(self.mutual.iter().cloned());
        lines.extend(self.sent.iter().cloned());
        if self.follows_you {
            lines.push("Follows you".to_string());
        }

        let visibility = match self.after_scrolls {
            0 => Visibility::Always,
            scrolls => Visibility::AfterScrolls(scrolls),
        };
        let mut elements = vec![ScriptedElement::new(&card_id)
            .matching(&locators.card)
            .text(&lines.join("\n"))
            .visible(visibility)
            .removed_on_click(&[accept_id.as_str(), ignore_id.as_str()])];

        if self.with_link {
            let mut link = part("link")
                .matching(&locators.profile_link)
                .attr("href", &self.profile_url());
            if !self.name.is_empty() {
                link = link.attr("aria-label", &format!("{}'s profile picture", self.name));
            }
            elements.push(link);
        }
        if !self.name.is_empty() && !self.name_in_label_only {
            elements.push(part("name").matching(&locators.name).text(&self.name));
        }
        elements.push(part("image").matching(&locators.image).attr(
            "src",
            &format!("https://media.licdn.com/inviter-{}.jpg", self.index),
        ));
        for (k, line) in lines.iter().enumerate() {
            elements.push(part(&format!("line-{}", k)).matching(&locators.text_lines).text(line));
        }
        if self.verified {
            elements.push(part("verified").matching(&locators.verified_badge));
        }

        let mut accept = ScriptedElement::new(&accept_id)
            .matching(&locators.accept_button)
            .attr("aria-label", &format!("Accept {}'s invitation", self.name))
            .child_of(&card_id);
        if self.failing_accept {
            accept = accept.failing_click();
        }
        elements.push(accept);
        elements.push(
            ScriptedElement::new(&ignore_id)
                .matching(&locators.ignore_button)
                .attr("aria-label", &format!("Ignore {}'s invitation", self.name))
                .child_of(&card_id),
        );
        elements
    }
}

/// Received-invitations page. Answering a card removes it, as on the live
/// page.
pub fn invitations_page(locators: &InvitationLocators, cards: &[InvitationCard]) -> ScriptedPage {
    cards
        .iter()
        .flat_map(|card| card.elements(locators))
        .fold(ScriptedPage::new(), ScriptedPage::with)
}
