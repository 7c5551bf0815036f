/*
 * Test utilities and mock helpers for Nitroctl
 *
 * Provides the simulated EC register store used by the unit tests: a plain
 * 256-byte file standing in for the kernel-exposed byte-addressable node.
 */
