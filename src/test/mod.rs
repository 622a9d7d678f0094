mod adaptive;
mod forwarding;
mod ids;
mod spanning_tree;

use crate::ctl::{HostTable, LoadTable, PolicyCtx, TenantTable};
use crate::net::{CommandLog, Dpid, MacAddr, PacketIn, PortNo};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// 直接驱动单个交换机策略所需的控制器状态
struct Harness {
    out: CommandLog,
    tenants: TenantTable,
    loads: LoadTable,
    hosts: HostTable,
    rng: StdRng,
}

impl Harness {
    fn new() -> Self {
        Self {
            out: CommandLog::default(),
            tenants: TenantTable::default(),
            loads: LoadTable::default(),
            hosts: HostTable::default(),
            rng: StdRng::seed_from_u64(7),
        }
    }

    fn ctx(&mut self) -> PolicyCtx<'_> {
        PolicyCtx {
            out: &mut self.out,
            tenants: &self.tenants,
            loads: &self.loads,
            hosts: &self.hosts,
            rng: &mut self.rng,
            hard_timeout: 10,
        }
    }
}

fn mac(n: u64) -> MacAddr {
    MacAddr::from_u64(n)
}

fn frame(dpid: u64, in_port: u16, src: MacAddr, dst: MacAddr) -> PacketIn {
    let mut pkt = PacketIn::new(Dpid(dpid), PortNo(in_port), src, dst);
    pkt.data = vec![0xab; 4];
    pkt
}

fn ports(ps: &[u16]) -> Vec<PortNo> {
    ps.iter().copied().map(PortNo).collect()
}
