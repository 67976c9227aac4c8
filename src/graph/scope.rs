use super::handles::NetIndex;
use super::signals::Signal;

/// What a probe samples.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(super) enum ProbeSource {
    Net(NetIndex),
    Clock,
}

#[derive(Debug, Clone)]
struct Probe {
    id: String,
    width: u32,
    source: ProbeSource,
    history: Vec<(u64, Signal)>,
}

/// Returns the VCD identifier of `signal` on `module`.
///
/// # Example
/// ```
/// # use synclogic::vcd_id;
/// assert_eq!(vcd_id("Program Counter", "CR_DATA_OUT"), "programcounter_cr_data_out");
/// assert_eq!(vcd_id("$ram#1", "OUT"), "ram1_out");
/// ```
pub fn vcd_id(module: &str, signal: &str) -> String {
    let keep = |c: &char| !c.is_whitespace() && *c != '$' && *c != '#';
    module
        .chars()
        .filter(keep)
        .chain(std::iter::once('_'))
        .chain(signal.chars().filter(keep))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Named group of monitored signals whose value changes are recorded after every half step.
///
/// Created with [System::add_scope](super::System::add_scope) and filled with
/// [System::monitor](super::System::monitor) before the system is initialized.
#[derive(Debug, Clone)]
pub struct VcdScope {
    name: String,
    probes: Vec<Probe>,
}

impl VcdScope {
    pub(super) fn new(name: String) -> Self {
        Self {
            name,
            probes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of monitored signals.
    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Returns the identifiers of the monitored signals in monitoring order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.probes.iter().map(|p| p.id.as_str())
    }

    /// Returns the recorded `(tick, value)` changes of the signal with identifier `id`.
    pub fn history(&self, id: &str) -> Option<&[(u64, Signal)]> {
        self.probes
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.history.as_slice())
    }

    /// Adds a probe, returns false if `source` was already monitored.
    pub(super) fn monitor(&mut self, source: ProbeSource, width: u32, module: &str, signal: &str) -> bool {
        if self.probes.iter().any(|p| p.source == source) {
            return false;
        }
        self.probes.push(Probe {
            id: vcd_id(module, signal),
            width,
            source,
            history: Vec::new(),
        });
        true
    }

    pub(super) fn sample(&mut self, time: u64, nets: &[Signal], clock: Signal) {
        for probe in &mut self.probes {
            let value = match probe.source {
                ProbeSource::Net(net) => nets[net.0],
                ProbeSource::Clock => clock,
            };
            if probe.history.last().map_or(true, |&(_, last)| last != value) {
                probe.history.push((time, value));
            }
        }
    }

    pub(super) fn clear_history(&mut self) {
        for probe in &mut self.probes {
            probe.history.clear();
        }
    }

    fn definitions(&self, out: &mut String) {
        out.push_str(&format!("$scope module {} $end\n", self.name));
        for probe in &self.probes {
            out.push_str(&format!(
                "$var wire {} {} {} $end\n",
                probe.width, probe.id, probe.id
            ));
        }
        out.push_str("$upscope $end\n");
    }
}

/// Timescale matching one half period of a clock running at `frequency` Hz, rounded to a power of 10.
pub(super) fn timescale(frequency: f64) -> String {
    const VALUES: [&str; 3] = ["100", "10", "1"];
    const UNITS: [&str; 5] = ["s", "ms", "us", "ns", "ps"];

    let power = ((2.0 * frequency).log10().round() as i64 + 2).max(0) as usize;
    let unit = UNITS[(power / 3).min(UNITS.len() - 1)];
    format!("{}{}", VALUES[power % 3], unit)
}

/// Renders `scopes` as a value change dump.
pub(super) fn render_vcd(scopes: &[&VcdScope], frequency: f64, date: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("$date {} $end\n", date));
    out.push_str("$version synclogic VCD dump $end\n");
    out.push_str(&format!("$timescale {} $end\n\n", timescale(frequency)));

    for scope in scopes {
        scope.definitions(&mut out);
    }
    out.push_str("$enddefinitions $end\n\n");

    let mut events: Vec<_> = scopes
        .iter()
        .flat_map(|scope| scope.probes.iter())
        .flat_map(|probe| {
            probe
                .history
                .iter()
                .map(move |&(time, value)| (time, value, probe))
        })
        .collect();
    events.sort_by_key(|&(time, _, _)| time);

    let mut current = None;
    for (time, value, probe) in events {
        if current != Some(time) {
            current = Some(time);
            out.push_str(&format!("#{}\n", time));
        }
        out.push_str(&format!(
            "b{:0width$b} {}\n",
            value,
            probe.id,
            width = probe.width as usize
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timescale() {
        assert_eq!(timescale(1.0), "1s");
        assert_eq!(timescale(0.005), "100s");
        assert_eq!(timescale(5.0), "100ms");
        assert_eq!(timescale(50.0), "10ms");
        assert_eq!(timescale(1e6), "1us");
        assert_eq!(timescale(0.5e12), "1ps");
    }

    #[test]
    fn test_sample_only_changes() {
        let mut scope = VcdScope::new("main".to_string());
        assert!(scope.monitor(ProbeSource::Net(NetIndex(0)), 4, "reg", "OUT"));
        assert!(!scope.monitor(ProbeSource::Net(NetIndex(0)), 4, "reg", "OUT"));
        assert!(scope.monitor(ProbeSource::Clock, 1, "System", "CLK"));

        let mut nets = [3];
        scope.sample(0, &nets, 0);
        scope.sample(1, &nets, 1);
        nets[0] = 5;
        scope.sample(2, &nets, 0);

        assert_eq!(scope.history("reg_out"), Some(&[(0, 3), (2, 5)][..]));
        assert_eq!(
            scope.history("system_clk"),
            Some(&[(0, 0), (1, 1), (2, 0)][..])
        );
        assert_eq!(scope.history("nope"), None);
    }

    #[test]
    fn test_render() {
        let mut a = VcdScope::new("a".to_string());
        a.monitor(ProbeSource::Net(NetIndex(0)), 4, "Reg", "OUT");
        let mut b = VcdScope::new("b".to_string());
        b.monitor(ProbeSource::Clock, 1, "System", "CLK");

        a.sample(0, &[3], 0);
        b.sample(0, &[3], 0);
        b.sample(1, &[3], 1);
        a.sample(2, &[9], 0);
        b.sample(2, &[9], 0);

        let vcd = render_vcd(&[&a, &b], 1.0, "2020-01-01 00:00");
        let expected = "\
$date 2020-01-01 00:00 $end
$version synclogic VCD dump $end
$timescale 1s $end

$scope module a $end
$var wire 4 reg_out reg_out $end
$upscope $end
$scope module b $end
$var wire 1 system_clk system_clk $end
$upscope $end
$enddefinitions $end

#0
b0011 reg_out
b0 system_clk
#1
b1 system_clk
#2
b1001 reg_out
b0 system_clk
";
        assert_eq!(vcd, expected);
    }
}
