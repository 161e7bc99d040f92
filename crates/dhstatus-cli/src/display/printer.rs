//! Status report rendering (full sections or the two-line short form).

use std::fmt::Display;
use std::io::{self, Write};

use chrono::{DateTime, Utc};
use console::{Emoji, Style};
use dhstatus_core::{
    BuildInfo, ClusterSnapshot, Evidence, Freshness, RegistryVerdict, StatusReport, Verdict,
    WatchTarget,
};

use super::helpers::{age, human_duration, truncate_message, utc_offset_label};
use super::icons::{self, Icons};
use super::{DisplayConfig, Palette};

const LABEL_WIDTH: usize = 19;

/// One rendered verdict: icon, colored title, parenthesised reason.
struct StatusView {
    icon: &'static Emoji<'static, 'static>,
    title: &'static str,
    reason: String,
    restart_hint: bool,
}

pub struct Printer {
    config: DisplayConfig,
    palette: Palette,
    icons: Icons,
}

impl Printer {
    pub fn new(config: DisplayConfig) -> Self {
        Self {
            palette: Palette::new(config.color),
            icons: Icons::new(config.emoji),
            config,
        }
    }

    pub fn render(
        &self,
        out: &mut impl Write,
        report: &StatusReport,
        now: DateTime<Utc>,
    ) -> io::Result<()> {
        if self.config.short {
            self.render_short(out, report, now)
        } else {
            self.render_full(out, report, now)
        }
    }

    /// Printed to stderr once the watch target is known.
    pub fn watch_header(&self, out: &mut impl Write, target: &WatchTarget) -> io::Result<()> {
        let p = &self.palette;
        writeln!(
            out,
            "{}",
            p.heading.apply_to(format!(
                "Watching {} for PR #{}",
                target.check_name, target.pull_request.number
            ))
        )?;
        writeln!(out, "{}", p.dim.apply_to(format!("Commit: {}", target.short_sha())))?;
        writeln!(out)
    }

    fn render_full(
        &self,
        out: &mut impl Write,
        report: &StatusReport,
        now: DateTime<Utc>,
    ) -> io::Result<()> {
        self.header(out, now)?;
        self.cluster_section(out, &report.snapshot, now)?;
        if report.pull_request.is_preview() && self.config.show_github {
            self.github_section(out, report)?;
        }
        self.status_section(out, report)
    }

    fn render_short(
        &self,
        out: &mut impl Write,
        report: &StatusReport,
        now: DateTime<Utc>,
    ) -> io::Result<()> {
        let p = &self.palette;
        let dot = p.dim.apply_to("·");
        writeln!(
            out,
            "{} {} {dot} {} {dot} {}",
            self.icons.get(&icons::TAG),
            p.bold.apply_to(report.snapshot.tag()),
            human_duration(age(report.snapshot.pod_created, now)),
            self.short_status(report),
        )?;
        if let Some(build) = report.build_info() {
            writeln!(
                out,
                "   {} #{} — {}",
                self.icons.get(&icons::PULL_REQUEST_SHORT),
                build.number,
                build.title
            )?;
        }
        Ok(())
    }

    fn header(&self, out: &mut impl Write, now: DateTime<Utc>) -> io::Result<()> {
        let p = &self.palette;
        let local = self.config.zone.localize(now);
        writeln!(out)?;
        writeln!(
            out,
            "{}",
            p.title.apply_to(format!("{} Deckhouse Status", self.icons.get(&icons::BANNER)))
        )?;
        writeln!(
            out,
            "   {} ({})",
            p.dim.apply_to(local.format("%a, %d %b %Y %H:%M:%S")),
            utc_offset_label(*local.offset())
        )?;
        writeln!(out)
    }

    fn section(
        &self,
        out: &mut impl Write,
        icon: &Emoji<'static, 'static>,
        title: &str,
    ) -> io::Result<()> {
        writeln!(
            out,
            "{}",
            self.palette
                .cyan
                .apply_to(format!("━━━ {} {title} ━━━", self.icons.get(icon)))
        )
    }

    fn row(
        &self,
        out: &mut impl Write,
        icon: &Emoji<'static, 'static>,
        label: &str,
        value: impl Display,
    ) -> io::Result<()> {
        let padding = LABEL_WIDTH.saturating_sub(label.len() + 1).max(1);
        writeln!(
            out,
            "{} {label}:{} {value}",
            self.icons.get(icon),
            " ".repeat(padding)
        )
    }

    fn cluster_section(
        &self,
        out: &mut impl Write,
        snapshot: &ClusterSnapshot,
        now: DateTime<Utc>,
    ) -> io::Result<()> {
        let p = &self.palette;
        let created = self.config.zone.localize(snapshot.pod_created);
        self.section(out, &icons::CLUSTER, "CLUSTER")?;
        self.row(out, &icons::IMAGE, "Image", p.bold.apply_to(snapshot.tag()))?;
        self.row(out, &icons::UPDATED, "Updated", created.format("%Y-%m-%d %H:%M"))?;
        self.row(
            out,
            &icons::POD_AGE,
            "Pod age",
            format!(
                "{} {}",
                human_duration(age(snapshot.pod_created, now)),
                p.dim.apply_to(format!("({})", snapshot.pod_phase))
            ),
        )?;
        self.row(out, &icons::POD, "Pod", p.dim.apply_to(&snapshot.pod_name))?;
        writeln!(out)
    }

    fn github_section(&self, out: &mut impl Write, report: &StatusReport) -> io::Result<()> {
        let p = &self.palette;
        self.section(out, &icons::GITHUB, "GITHUB")?;

        let build = match &report.build {
            Some(Ok(build)) => build,
            Some(Err(err)) => {
                self.row(out, &icons::ERROR, "Error", p.red.apply_to(err))?;
                return writeln!(out);
            }
            None => {
                self.row(out, &icons::ERROR, "Error", p.red.apply_to("no data"))?;
                return writeln!(out);
            }
        };

        self.row(
            out,
            &icons::PULL_REQUEST,
            "PR",
            format!("{} — {}", p.bold.apply_to(format!("#{}", build.number)), build.title),
        )?;
        self.row(out, &icons::URL, "URL", p.dim.apply_to(&build.url))?;
        self.commit_rows(out, build)?;
        writeln!(out)
    }

    fn commit_rows(&self, out: &mut impl Write, build: &BuildInfo) -> io::Result<()> {
        let p = &self.palette;
        if !build.commit_author.is_empty() {
            let date = build
                .commit_date
                .map(|d| {
                    let day = self.config.zone.localize(d).format("%Y-%m-%d");
                    format!(" {}", p.dim.apply_to(format!("({day})")))
                })
                .unwrap_or_default();
            self.row(out, &icons::AUTHOR, "Last commit", format!("{}{date}", build.commit_author))?;
        }
        if !build.commit_message.is_empty() {
            self.row(
                out,
                &icons::MESSAGE,
                "Message",
                p.dim.apply_to(truncate_message(&build.commit_message)),
            )?;
        }
        Ok(())
    }

    fn status_section(&self, out: &mut impl Write, report: &StatusReport) -> io::Result<()> {
        let p = &self.palette;
        let view = self.status_view(report);
        self.section(out, &icons::STATUS, "STATUS")?;
        self.row(
            out,
            view.icon,
            "Status",
            format!(
                "{}  {}",
                self.verdict_style(report.freshness.verdict).apply_to(view.title),
                p.dim.apply_to(format!("({})", view.reason))
            ),
        )?;
        if view.restart_hint {
            self.row(out, &icons::ACTION, "Action", p.yellow.apply_to("restart pod to update"))?;
        }
        if self.config.show_registry {
            if let Some(registry) = &report.registry {
                let summary = registry_summary(registry);
                self.row(out, &icons::REGISTRY, "Registry", p.dim.apply_to(summary))?;
            }
        }
        writeln!(out)
    }

    fn status_view(&self, report: &StatusReport) -> StatusView {
        let build_name = report.pull_request.check_name();
        let zone = &self.config.zone;
        let clock = |t: DateTime<Utc>| zone.localize(t).format("%H:%M").to_string();
        let Freshness { verdict, evidence } = &report.freshness;

        let (icon, title, reason) = match evidence {
            Evidence::DigestMatches => (
                &icons::UP_TO_DATE,
                "Up to date",
                "digest matches registry".to_string(),
            ),
            Evidence::DigestDiffers { .. } => (
                &icons::OUTDATED,
                "Outdated",
                "registry has newer image for tag".to_string(),
            ),
            Evidence::CheckRunning { .. } => (
                &icons::BUILDING,
                "Building",
                format!("{build_name} is running..."),
            ),
            Evidence::PodNewerThanBuild {
                pod_created,
                build_completed,
            } => (
                &icons::UP_TO_DATE,
                "Up to date",
                format!(
                    "pod created after {build_name}: {} > {}",
                    clock(*pod_created),
                    clock(*build_completed)
                ),
            ),
            Evidence::BuildNewerThanPod {
                pod_created,
                build_completed,
            } => (
                &icons::OUTDATED,
                "Outdated",
                format!(
                    "{build_name} completed after pod: {} > {}",
                    clock(*build_completed),
                    clock(*pod_created)
                ),
            ),
            Evidence::CheckFailed => (
                &icons::FAILED,
                "Build failed",
                format!("{build_name} failed on last commit"),
            ),
            Evidence::CheckNotStarted => (
                &icons::WAITING,
                "Waiting for CI",
                format!("{build_name} not started yet"),
            ),
            Evidence::CheckStatus { status } => (
                &icons::UNKNOWN,
                "Cannot determine",
                format!("{build_name} status: {status}"),
            ),
            Evidence::RegistryError { message } => (
                &icons::UNKNOWN,
                "Cannot determine",
                format!("registry: {message}"),
            ),
            Evidence::NoData => (
                &icons::UNKNOWN,
                "Cannot determine",
                "no registry tag, no build info".to_string(),
            ),
        };

        StatusView {
            icon,
            title,
            reason,
            restart_hint: *verdict == Verdict::Outdated,
        }
    }

    fn short_status(&self, report: &StatusReport) -> String {
        let p = &self.palette;
        let verdict = report.freshness.verdict;
        let (icon, title) = match verdict {
            Verdict::UpToDate => (&icons::UP_TO_DATE, "Up to date"),
            Verdict::Outdated => (&icons::OUTDATED, "Outdated"),
            Verdict::Building => (&icons::BUILDING, "Building..."),
            Verdict::BuildFailed => (&icons::FAILED, "Build failed"),
            Verdict::WaitingForCi => (&icons::WAITING, "Waiting for CI..."),
            Verdict::Unknown => (&icons::UNKNOWN, "Unknown"),
        };
        let line = self
            .verdict_style(verdict)
            .apply_to(format!("{} {title}", self.icons.get(icon)))
            .to_string();

        match report.freshness.evidence {
            Evidence::BuildNewerThanPod { .. } => format!(
                "{line} {}",
                p.dim
                    .apply_to(format!("(new {})", report.pull_request.check_name()))
            ),
            _ => line,
        }
    }

    fn verdict_style(&self, verdict: Verdict) -> &Style {
        let p = &self.palette;
        match verdict {
            Verdict::UpToDate => &p.green,
            Verdict::Outdated => &p.yellow,
            Verdict::BuildFailed => &p.red,
            Verdict::Building | Verdict::WaitingForCi => &p.cyan,
            Verdict::Unknown => &p.plain,
        }
    }
}

fn registry_summary(registry: &RegistryVerdict) -> String {
    match &registry.error {
        Some(err) => format!("error ({err})"),
        None if registry.tag_exists => "tag available".to_string(),
        None if registry.image_exists => "tag removed (image exists by digest)".to_string(),
        None => "tag removed".to_string(),
    }
}
