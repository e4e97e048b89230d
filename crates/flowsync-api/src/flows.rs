// Flow inventory endpoints
//
// Per-node access to table 0 of the config datastore: whole-table fetch
// and flush, and single-flow get/put/delete. Status handling is left to
// the caller; a 404 here is just an `Error::HttpStatus`.

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::client::{ContentType, Method, OdlClient};
use crate::error::Error;
use crate::models::{FLOW_TABLE_ID, Flow, FlowEnvelope, FlowTable, TableResponse};

const INVENTORY: [&str; 4] = ["restconf", "config", "opendaylight-inventory:nodes", "node"];
const TABLE: &str = "flow-node-inventory:table";

/// `.../node/{node}/flow-node-inventory:table/0/`
pub fn table_path(node: &str) -> Result<String, Error> {
    let table = FLOW_TABLE_ID.to_string();
    let [r, c, n, k] = INVENTORY;
    encode_path([r, c, n, k, segment("node", node)?, TABLE, table.as_str(), ""])
}

/// `.../node/{node}/flow-node-inventory:table/0/flow/{flow_id}`
pub fn flow_path(node: &str, flow_id: &str) -> Result<String, Error> {
    let table = FLOW_TABLE_ID.to_string();
    let [r, c, n, k] = INVENTORY;
    encode_path([
        r,
        c,
        n,
        k,
        segment("node", node)?,
        TABLE,
        table.as_str(),
        "flow",
        segment("flow id", flow_id)?,
    ])
}

/// Reject ids that would collapse onto a different resource once joined.
fn segment<'a>(what: &str, value: &'a str) -> Result<&'a str, Error> {
    if matches!(value, "" | "." | "..") {
        return Err(Error::InvalidArgument(format!(
            "{what} '{value}' can't be used in a resource path"
        )));
    }
    Ok(value)
}

/// Join segments into an absolute path, percent-encoding each one so `/`,
/// `#`, `?` and `%` stay inside their segment.
fn encode_path<'a>(segments: impl IntoIterator<Item = &'a str>) -> Result<String, Error> {
    let mut url = Url::parse("http://controller.invalid/")?;
    url.path_segments_mut()
        .map_err(|()| Error::InvalidArgument("controller URL can't take a path".into()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.path().to_owned())
}

impl OdlClient {
    /// Send one single-flow request to `node`.
    pub async fn flow(
        &self,
        method: Method,
        node: &str,
        flow_id: &str,
        body: Option<&str>,
    ) -> Result<Option<Value>, Error> {
        debug!(%method, node, flow_id, "flow request");
        self.request(method, &flow_path(node, flow_id)?, body, ContentType::Json)
            .await
    }

    /// Install or replace a flow on `node`.
    ///
    /// `PUT .../table/0/flow/{id}` with `{"flow": [flow]}`
    pub async fn put_flow(&self, node: &str, flow: &Flow) -> Result<Option<Value>, Error> {
        debug!(node, flow_id = %flow.id, "installing flow");
        self.request_json(
            Method::Put,
            &flow_path(node, &flow.id)?,
            &FlowEnvelope { flow: [flow] },
        )
        .await
    }

    /// Fetch table 0 of `node`.
    ///
    /// `GET .../table/0/`
    pub async fn get_table(&self, node: &str) -> Result<Vec<FlowTable>, Error> {
        debug!(node, "fetching flow table");
        let value = self
            .request(Method::Get, &table_path(node)?, None, ContentType::Json)
            .await?;
        let doc: TableResponse = Self::decode(value)?;
        Ok(doc.table)
    }

    /// Remove table 0 of `node` with every flow in it.
    ///
    /// `DELETE .../table/0/`
    pub async fn delete_table(&self, node: &str) -> Result<(), Error> {
        debug!(node, "flushing flow table");
        self.request(Method::Delete, &table_path(node)?, None, ContentType::Json)
            .await?;
        Ok(())
    }
}
