use super::connection::{Connection, Driver};
use super::system::{System, SystemInput, SYSTEM_NAME};
use petgraph::dot::Dot;
use petgraph::graph::NodeIndex;
use petgraph::Graph;
use std::collections::HashMap;
use strum::IntoEnumIterator;

impl System {
    /// Returns the source module and output name driving a net.
    fn net_source(&self, net: usize) -> (usize, &'static str) {
        // Modules own contiguous ascending ranges of the net table.
        let module = self
            .modules
            .partition_point(|entry| entry.output_base + entry.outputs.len() <= net);
        let entry = &self.modules[module];
        (module, entry.outputs.as_slice()[net - entry.output_base].name)
    }

    /// Builds the connection graph: one node per module, per distinct constant and one for
    /// the system inputs, one edge per input source.
    fn connection_graph(&self) -> Graph<String, String> {
        let mut graph = Graph::new();
        let modules: Vec<NodeIndex> = self
            .modules
            .iter()
            .map(|entry| graph.add_node(entry.name.clone()))
            .collect();
        let mut constants = HashMap::new();

        let mut add_edge = |graph: &mut Graph<String, String>,
                            dst: NodeIndex,
                            connection: &Connection,
                            input: &str| {
            let (src, output) = match connection.driver {
                Driver::Net(net) => {
                    let (module, output) = self.net_source(net.0);
                    (modules[module], output.to_string())
                }
                Driver::Const(value) => {
                    let node = *constants
                        .entry(value)
                        .or_insert_with(|| graph.add_node(format!("{:#x}", value)));
                    (node, "const".to_string())
                }
            };
            let suffix = if connection.active_low {
                " (active low)"
            } else {
                ""
            };
            graph.add_edge(src, dst, format!("{} -> {}{}", output, input, suffix));
        };

        for (entry, &node) in self.modules.iter().zip(modules.iter()) {
            for (drivers, input) in entry.drivers.iter().zip(entry.inputs.iter()) {
                for connection in drivers {
                    add_edge(&mut graph, node, connection, input.name);
                }
            }
        }

        if self.system_inputs.iter().any(|drivers| !drivers.is_empty()) {
            let system = graph.add_node(SYSTEM_NAME.to_string());
            for input in SystemInput::iter() {
                for connection in &self.system_inputs[usize::from(input)] {
                    add_edge(&mut graph, system, connection, &input.to_string());
                }
            }
        }
        graph
    }

    /// Returns the connections of the system in
    /// [dot](https://en.wikipedia.org/wiki/DOT_(graph_description_language)) format.
    pub fn dot(&self) -> String {
        let graph = self.connection_graph();
        format!("{}", Dot::with_config(&graph, &[]))
    }

    /// Dumps the connections of the system in dot format to path `filename`, to be visualized
    /// with graphviz or [gephi](https://gephi.org/).
    pub fn dump_dot<P: AsRef<std::path::Path>>(&self, filename: P) -> std::io::Result<()> {
        std::fs::write(filename, self.dot())
    }
}
